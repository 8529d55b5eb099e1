use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/initialize", post(handlers::initialize))
        // Capture control
        .route("/session/recording/start", post(handlers::start_recording))
        .route("/session/recording/stop", post(handlers::stop_recording))
        // Playback control
        .route(
            "/session/recordings/:index/toggle",
            post(handlers::toggle_recording),
        )
        .route("/session/response/toggle", post(handlers::toggle_response))
        .route("/session/playback/stop", post(handlers::stop_playback))
        .route("/session/message/dismiss", post(handlers::dismiss_message))
        // Presentation layers may be served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
