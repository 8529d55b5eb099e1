use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::EncodingPreset;
use crate::session::ControllerConfig;
use crate::transfer::ResponseMode;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transfer: TransferConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct TransferConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub response_mode: ResponseMode,
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub preset: EncodingPreset,
    #[serde(default)]
    pub auto_play_response: bool,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub recordings_path: String,
    pub responses_path: String,
    #[serde(default)]
    pub persist_responses: bool,
}

impl Config {
    /// Load from `path` (any extension the config crate knows), overridden by
    /// `VOICE_TUTOR__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_TUTOR").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            encoding: self.audio.preset.encoding(),
            response_mode: self.transfer.response_mode,
            auto_play_response: self.audio.auto_play_response,
            transfer_timeout: self.transfer_timeout(),
            responses_dir: PathBuf::from(&self.storage.responses_path),
            persist_responses: self.storage.persist_responses,
        }
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer.timeout_secs)
    }
}
