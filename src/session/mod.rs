//! Lesson session management
//!
//! This module provides the `LessonController` that manages:
//! - Microphone permission and capture channel preparation
//! - The append-only log of finished recordings
//! - Upload of each capture and interpretation of the tutor's reply
//! - Mutually exclusive playback of recordings and the reply

mod config;
mod controller;
mod state;

pub use config::ControllerConfig;
pub use controller::LessonController;
pub use state::{
    format_duration, ActivePlayback, Phase, PlaybackTarget, RecordingEntry, RecordingSummary,
    ResponseSource, ServerResponse, SessionSnapshot,
};
