//! Source metadata endpoint

use axum::{Json, extract::State};
use gantry_core::domain::source::SourceInfo;

use crate::state::AppState;

/// GET /info
/// Repository metadata the server was configured with
pub async fn source_info(State(state): State<AppState>) -> Json<SourceInfo> {
    Json(state.source)
}
