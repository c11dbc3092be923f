use axum::{extract::State, Json};
use tracing::debug;

use crate::{foundry::AnvilInfo, AppState};

/// Current anvil status, probed with the configured liveness strategy.
pub async fn anvil_status_handler(State(state): State<AppState>) -> Json<AnvilInfo> {
    let info = state.anvil.status().await;
    debug!("Anvil status over HTTP: running={}", info.running);
    Json(info)
}
