use super::state::AppState;
use crate::session::SessionSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let controller = state.controller.lock().await;
    Json(controller.snapshot())
}

/// POST /session/initialize
pub async fn initialize(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.initialize().await;
    Json(controller.snapshot())
}

/// POST /session/recording/start
pub async fn start_recording(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.start_recording().await;
    Json(controller.snapshot())
}

/// POST /session/recording/stop
/// Holds the session until the upload has finished
pub async fn stop_recording(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.stop_recording().await;
    Json(controller.snapshot())
}

/// POST /session/recordings/:index/toggle
/// `index` is 0-based, matching the snapshot's recording rows
pub async fn toggle_recording(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.toggle_recording_playback(index).await;
    Json(controller.snapshot())
}

/// POST /session/response/toggle
pub async fn toggle_response(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.toggle_response_playback().await;
    Json(controller.snapshot())
}

/// POST /session/playback/stop
pub async fn stop_playback(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.stop_playback().await;
    Json(controller.snapshot())
}

/// POST /session/message/dismiss
pub async fn dismiss_message(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.dismiss_message();
    Json(controller.snapshot())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
