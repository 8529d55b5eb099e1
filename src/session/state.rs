use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::audio::{AudioRef, PlaybackToken};
use crate::lesson::{Grade, Language};

/// Lifecycle phase of a lesson session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Initializing,
    Ready,
    Recording,
    Stopping,
    Uploading,
    PlayingLocal,
    PlayingResponse,
    Error,
}

impl Phase {
    /// Phases in which a capture or upload owns the session
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Recording | Phase::Stopping | Phase::Uploading)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::PlayingLocal | Phase::PlayingResponse)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Initializing => "initializing",
            Phase::Ready => "ready",
            Phase::Recording => "recording",
            Phase::Stopping => "stopping",
            Phase::Uploading => "uploading",
            Phase::PlayingLocal => "playing a recording",
            Phase::PlayingResponse => "playing the response",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Render milliseconds as `M:SS`
///
/// Seconds are rounded half up; a rounded 60 carries into the minutes.
pub fn format_duration(ms: u64) -> String {
    let mut minutes = ms / 60_000;
    let mut seconds = (ms % 60_000 + 500) / 1000;
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }
    format!("{}:{:02}", minutes, seconds)
}

/// One finished capture in the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingEntry {
    /// Position in the log (0-indexed)
    pub index: usize,
    /// Local file holding the capture
    pub locator: PathBuf,
    /// Recorded length in milliseconds
    pub duration_ms: u64,
    /// When the capture was finalized
    pub recorded_at: DateTime<Utc>,
}

impl RecordingEntry {
    /// Length in whole seconds, rounded half up
    pub fn duration_secs(&self) -> u64 {
        (self.duration_ms + 500) / 1000
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_ms)
    }

    pub fn audio(&self) -> AudioRef {
        AudioRef::File(self.locator.clone())
    }
}

/// Where the response audio came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    /// Carried in the upload reply body
    Inline,
    /// Fetched from the URL named in the reply
    Downloaded { url: String },
}

/// The tutor's reply to the latest upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    pub audio: AudioRef,
    pub source: ResponseSource,
    pub received_at: DateTime<Utc>,
}

/// What the playback handle is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum PlaybackTarget {
    Recording(usize),
    Response,
}

/// The single active playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePlayback {
    pub token: PlaybackToken,
    pub target: PlaybackTarget,
}

/// Recording row as shown to the learner
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub index: usize,
    pub duration: String,
    pub locator: PathBuf,
}

/// Serializable view of a session for presentation layers
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub language: Language,
    pub grade: Grade,
    pub recordings: Vec<RecordingSummary>,
    pub response_available: bool,
    pub response_source: Option<ResponseSource>,
    pub playing: Option<PlaybackTarget>,
    pub last_message: Option<String>,
}
