use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{PipelineError, RunError};
use crate::models::simulation::{
    DayQuery, ErrorResponse, OfflineModeSetting, SimulationRequest, SimulationResponse,
};
use crate::services::pipeline::ProductionPipeline;
use crate::services::simulation_service::simulate_configured_day;
use crate::shared_state::AppState;

fn rejected(e: &PipelineError) -> axum::response::Response {
    warn!(error = %e, "simulation rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse { error: e.to_string() }),
    )
        .into_response()
}

/// GET /api/config
/// Get the loaded configuration
///
/// Returns site, array geometry, module, mounting, window and ambient settings.
#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Loaded configuration", body = Config)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.as_ref().clone()).into_response()
}

/// POST /api/simulate
/// Run the production pipeline on caller-supplied series
///
/// Takes front/rear plane-of-array irradiance and ambient conditions and returns
/// instantaneous power, hourly energy and the daily summary. Module and mounting
/// default to the configured ones.
#[utoipa::path(
    post,
    path = "/api/simulate",
    request_body = SimulationRequest,
    responses(
        (status = 200, description = "Production result", body = SimulationResponse),
        (status = 422, description = "Input rejected by the pipeline", body = ErrorResponse)
    )
)]
pub async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> impl IntoResponse {
    let module = request.module.unwrap_or(state.config.module);
    let thermal = request.thermal.unwrap_or(state.config.thermal);

    let (irradiance, ambient) = match request.series() {
        Ok(series) => series,
        Err(e) => return rejected(&e),
    };
    match ProductionPipeline::from(thermal).run(&irradiance, &ambient, &module) {
        Ok(result) => (StatusCode::OK, Json(SimulationResponse::from(&result))).into_response(),
        Err(e) => rejected(&e),
    }
}

/// GET /api/simulation/day
/// Simulate the configured site for one day
///
/// Clear-sky irradiance, front/rear decomposition and ambient conditions
/// (Open-Meteo, or the offline profile) feed the production pipeline.
#[utoipa::path(
    get,
    path = "/api/simulation/day",
    params(DayQuery),
    responses(
        (status = 200, description = "Production result", body = SimulationResponse),
        (status = 422, description = "Input rejected by the pipeline", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn simulate_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> impl IntoResponse {
    match simulate_configured_day(&state.config, query.date, state.is_offline()).await {
        Ok(result) => (StatusCode::OK, Json(SimulationResponse::from(&result))).into_response(),
        Err(RunError::Pipeline(e)) => rejected(&e),
        Err(RunError::Config(e)) => {
            error!(error = %e, "configured day could not be simulated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: e.to_string() }),
            )
                .into_response()
        }
    }
}

/// GET /api/settings/offline-mode
/// Whether ambient conditions come from the offline profile
#[utoipa::path(
    get,
    path = "/api/settings/offline-mode",
    responses(
        (status = 200, description = "Current offline mode", body = OfflineModeSetting)
    )
)]
pub async fn get_offline_mode(State(state): State<AppState>) -> impl IntoResponse {
    Json(OfflineModeSetting {
        offline_mode: state.is_offline(),
    })
}

/// POST /api/settings/offline-mode
/// Switch between Open-Meteo and the offline ambient profile
#[utoipa::path(
    post,
    path = "/api/settings/offline-mode",
    request_body = OfflineModeSetting,
    responses(
        (status = 200, description = "Updated offline mode", body = OfflineModeSetting)
    )
)]
pub async fn set_offline_mode(
    State(state): State<AppState>,
    Json(setting): Json<OfflineModeSetting>,
) -> impl IntoResponse {
    state.set_offline(setting.offline_mode);
    info!(offline_mode = setting.offline_mode, "offline mode updated");
    Json(setting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use axum::body::to_bytes;
    use axum::response::Response;
    use serde_json::{Value, json};

    fn offline_state() -> AppState {
        let mut config = sample_config();
        config.offline_mode = true;
        AppState::new(config)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(body: Value) -> Json<SimulationRequest> {
        Json(serde_json::from_value(body).unwrap())
    }

    #[tokio::test]
    async fn config_is_returned_as_loaded() {
        let response = get_config(State(offline_state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["site"]["timezone"], "-01:00");
        assert_eq!(body["module"]["rated_power_stc"], 500.0);
    }

    #[tokio::test]
    async fn simulate_returns_points_and_energy() {
        let body = json!({
            "irradiance": [
                { "timestamp": "2025-06-21T12:00:00-01:00", "front": 1000, "rear": 0 },
                { "timestamp": "2025-06-21T12:01:00-01:00", "front": 1000, "rear": 0 }
            ],
            "module": { "rated_power_stc": 500, "temperature_coefficient": -3.8, "bifaciality": 0.7 },
            "thermal": { "a": -3.47, "b": -0.0594, "delta_t": 3.0 },
            "ambient": { "air_temperature": 25.0, "wind_speed": 1.0 }
        });
        let response = simulate(State(offline_state()), request(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["points"].as_array().unwrap().len(), 2);
        assert_eq!(body["hourly_energy"].as_array().unwrap().len(), 1);
        assert_eq!(body["hourly_energy"][0]["samples"], 2);
    }

    #[tokio::test]
    async fn mismatched_ambient_is_unprocessable() {
        let body = json!({
            "irradiance": [
                { "timestamp": "2025-06-21T12:00:00-01:00", "front": 500, "rear": 50 },
                { "timestamp": "2025-06-21T12:01:00-01:00", "front": 500, "rear": 50 }
            ],
            "ambient": { "air_temperature": [20.0], "wind_speed": 1.0 }
        });
        let response = simulate(State(offline_state()), request(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn single_point_is_unprocessable() {
        let body = json!({
            "irradiance": [{ "timestamp": "2025-06-21T12:00:00-01:00", "front": 500, "rear": 50 }],
            "ambient": { "air_temperature": 20.0, "wind_speed": 1.0 }
        });
        let response = simulate(State(offline_state()), request(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn configured_day_runs_offline() {
        let query = Query(DayQuery { date: None });
        let response = simulate_day(State(offline_state()), query).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["points"].as_array().unwrap().len(), 1440);
        assert!(body["daily_summary"]["energy_kwh"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn offline_mode_can_be_toggled() {
        let state = offline_state();
        set_offline_mode(State(state.clone()), Json(OfflineModeSetting { offline_mode: false }))
            .await
            .into_response();
        assert!(!state.is_offline());
        let body = body_json(get_offline_mode(State(state)).await.into_response()).await;
        assert_eq!(body["offline_mode"], false);
    }
}
