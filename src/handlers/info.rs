use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::ServiceInfo;
use crate::state::AppState;

/// Service information at `/`. Reachable without a signature.
#[instrument(skip(state))]
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
