use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::encoding::AudioEncoding;

/// Outcome of a microphone permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Reference to playable audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRef {
    /// Audio stored in a local file
    File(PathBuf),
    /// Audio held in memory (e.g. a binary server reply)
    Buffer(Arc<Vec<u8>>),
}

impl AudioRef {
    /// Raw bytes of the referenced audio
    pub async fn read(&self) -> Result<Vec<u8>> {
        match self {
            AudioRef::File(path) => Ok(tokio::fs::read(path).await?),
            AudioRef::Buffer(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// A prepared, single-use capture channel
///
/// Obtained from [`AudioDevice::prepare`] and consumed by [`AudioDevice::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHandle {
    id: Uuid,
    encoding: AudioEncoding,
}

impl CaptureHandle {
    pub fn new(encoding: AudioEncoding) -> Self {
        Self {
            id: Uuid::new_v4(),
            encoding,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn encoding(&self) -> &AudioEncoding {
        &self.encoding
    }
}

/// Result of finalizing a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    /// Local file holding the recording
    pub path: PathBuf,
    /// Recorded length in milliseconds
    pub duration_ms: u64,
}

/// Identifies one playback started by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlaybackToken(pub u64);

/// Notifications emitted by an audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback ran to its end. Emitted once per token, never after `stop_playback`.
    Finished(PlaybackToken),
}

/// Channel an audio device reports playback events on
pub type PlaybackEventSender = mpsc::UnboundedSender<PlaybackEvent>;
pub type PlaybackEventReceiver = mpsc::UnboundedReceiver<PlaybackEvent>;

/// Microphone and speaker primitives supplied by the host platform
///
/// Implementations:
/// - `FileAudioDevice`: replays a WAV clip as the microphone, times playback (headless)
/// - Tests: scripted fakes
#[async_trait::async_trait]
pub trait AudioDevice: Send + Sync {
    /// Ask the platform for microphone access
    async fn request_permission(&mut self) -> Result<Permission>;

    /// Prepare a capture channel with the given encoding
    async fn prepare(&mut self, encoding: &AudioEncoding) -> Result<CaptureHandle>;

    /// Begin capturing on a prepared channel
    async fn start(&mut self, handle: &CaptureHandle) -> Result<()>;

    /// Finalize the capture and hand back the recorded audio
    async fn stop(&mut self, handle: CaptureHandle) -> Result<CapturedAudio>;

    /// Start playing `audio`; completion is reported as `PlaybackEvent::Finished(token)`
    async fn play(&mut self, token: PlaybackToken, audio: &AudioRef) -> Result<()>;

    /// Stop the playback identified by `token`
    async fn stop_playback(&mut self, token: PlaybackToken) -> Result<()>;

    /// Get device name for logging
    fn name(&self) -> &str;
}
