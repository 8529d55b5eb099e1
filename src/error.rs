//! Error types for the lesson session
//!
//! Collaborators report failures as `anyhow::Error`; the controller folds them
//! into a `ControllerError` and surfaces it through its message slot.

use thiserror::Error;

use crate::session::Phase;

/// Failures observed by the lifecycle controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Microphone permission was refused
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// Capture requested before a capture channel was prepared, or the device failed
    #[error("Audio device not ready: {0}")]
    DeviceNotReady(String),

    /// Request arrived while another operation owns the session
    #[error("Session is busy ({0})")]
    Busy(Phase),

    /// Network or server failure during upload or download
    #[error("Transfer failed: {0}")]
    TransferFailure(String),

    /// Reply did not carry audio in the configured shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Audio playback could not start or stop
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),
}

impl ControllerError {
    /// Whether the session can keep going without re-initialization
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ControllerError::PermissionDenied)
    }

    /// Message suitable for the presentation layer
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::PermissionDenied => {
                "Microphone access was denied. Allow it and try again.".to_string()
            }
            ControllerError::DeviceNotReady(detail) => format!(
                "Recording is not available ({}). Please wait for initialization to complete.",
                detail
            ),
            ControllerError::Busy(phase) => format!("Please wait, currently {}.", phase),
            ControllerError::TransferFailure(detail) => {
                format!("Could not reach the tutor service: {}", detail)
            }
            ControllerError::MalformedResponse(detail) => {
                format!("The tutor service sent an unexpected reply: {}", detail)
            }
            ControllerError::PlaybackFailure(detail) => format!("Playback failed: {}", detail),
        }
    }
}

/// Invalid lesson selection input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LessonError {
    #[error("Unknown language '{0}' (expected English, Sinhala or Tamil)")]
    UnknownLanguage(String),

    #[error("Invalid grade '{0}' (expected 1 to 13)")]
    InvalidGrade(String),
}
