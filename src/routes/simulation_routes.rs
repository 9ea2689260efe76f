use axum::{
    Router,
    routing::{get, post},
};

use crate::controllers::simulation_controller::{
    get_config, get_offline_mode, set_offline_mode, simulate, simulate_day,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn simulation_routes(state: AppState) -> Router {
    Router::new()
        .route("/config",                 get(get_config))
        .route("/simulate",               post(simulate))
        .route("/simulation/day",         get(simulate_day))
        .route("/settings/offline-mode",  get(get_offline_mode).post(set_offline_mode))
        .with_state(state)
}
