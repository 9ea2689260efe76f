use utoipa::OpenApi;
use crate::controllers::simulation_controller;
use crate::models::{power, simulation};
use crate::services::temperature_model;
use crate::config;

#[derive(OpenApi)]
#[openapi(
    paths(
        simulation_controller::get_config,
        simulation_controller::simulate,
        simulation_controller::simulate_day,
        simulation_controller::get_offline_mode,
        simulation_controller::set_offline_mode
    ),
    components(
        schemas(
            config::Config,
            power::ModuleSpec,
            power::HourlyEnergy,
            power::DailySummary,
            temperature_model::Mounting,
            temperature_model::MountingPreset,
            simulation::SimulationRequest,
            simulation::SimulationResponse,
            simulation::PowerPoint,
            simulation::ErrorResponse,
            simulation::OfflineModeSetting
        )
    ),
    tags(
        (name = "bifacial-yield-sim", description = "Bifacial PV Production Simulation API")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in ["/api/config", "/api/simulate", "/api/simulation/day", "/api/settings/offline-mode"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
