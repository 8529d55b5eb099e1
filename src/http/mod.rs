//! HTTP API for an out-of-process presentation layer
//!
//! Every session route answers with the session snapshot; failures show up in
//! its `last_message` field rather than as HTTP errors.
//! - GET /session - Current snapshot
//! - POST /session/initialize - Retry permission and capture setup
//! - POST /session/recording/start - Start capturing
//! - POST /session/recording/stop - Stop, log and upload the capture
//! - POST /session/recordings/:index/toggle - Play or stop a past recording
//! - POST /session/response/toggle - Play or stop the tutor's reply
//! - POST /session/playback/stop - Stop whatever is playing
//! - POST /session/message/dismiss - Clear the message slot
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
