use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioEncoding, EncodingPreset};
use crate::transfer::ResponseMode;

/// Configuration for a lesson session controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Encoding requested when preparing a capture channel
    pub encoding: AudioEncoding,

    /// Shape of the tutor service's reply
    pub response_mode: ResponseMode,

    /// Start playing a response as soon as it arrives
    /// Default: false (the response is flagged as available instead)
    pub auto_play_response: bool,

    /// Upper bound on each upload and download
    /// Default: 30 seconds
    pub transfer_timeout: Duration,

    /// Where inline (binary) replies are written when `persist_responses` is set
    pub responses_dir: PathBuf,

    /// Keep binary replies on disk instead of in memory
    pub persist_responses: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingPreset::default().encoding(),
            response_mode: ResponseMode::default(),
            auto_play_response: false,
            transfer_timeout: Duration::from_secs(30),
            responses_dir: PathBuf::from("responses"),
            persist_responses: false,
        }
    }
}
