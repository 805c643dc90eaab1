// Plain HTTP endpoints served next to the WebSocket.

use crate::interface_adapters::state::AppState;
use axum::{Json, extract::State};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    // Registered players, including connections that have not chosen a name yet.
    pub player_count: usize,
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        player_count: state.arena.player_count(),
    })
}
