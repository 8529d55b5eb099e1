use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::config::ControllerConfig;
use super::state::{
    ActivePlayback, Phase, PlaybackTarget, RecordingEntry, RecordingSummary, ResponseSource,
    ServerResponse, SessionSnapshot,
};
use crate::audio::{AudioDevice, AudioRef, CaptureHandle, Permission, PlaybackEvent, PlaybackToken};
use crate::error::ControllerError;
use crate::lesson::SessionContext;
use crate::transfer::{AudioAttachment, ResponsePayload, TransferService, UploadRequest};

/// Drives one lesson session: capture, upload, and playback of recordings and replies
///
/// Operations never fail outward. Every failure becomes a phase transition plus an
/// entry in the message slot (`last_message` / `last_error`).
pub struct LessonController {
    config: ControllerConfig,
    context: SessionContext,
    audio: Box<dyn AudioDevice>,
    transfer: Box<dyn TransferService>,

    phase: Phase,

    /// Prepared capture channel, consumed by each stop
    capture: Option<CaptureHandle>,

    /// Finished captures, append-only
    recordings: Vec<RecordingEntry>,

    /// Reply to the latest upload
    response: Option<ServerResponse>,

    /// The single active playback
    playback: Option<ActivePlayback>,
    next_token: u64,

    last_message: Option<String>,
    last_error: Option<ControllerError>,

    /// Latest snapshot, republished on every change
    updates: watch::Sender<SessionSnapshot>,
}

impl LessonController {
    /// Create an idle controller; call [`initialize`](Self::initialize) before recording
    pub fn new(
        config: ControllerConfig,
        context: SessionContext,
        audio: Box<dyn AudioDevice>,
        transfer: Box<dyn TransferService>,
    ) -> Self {
        info!(
            "Creating lesson session: {} grade {} (audio: {}, transfer: {})",
            context.language,
            context.grade,
            audio.name(),
            transfer.name()
        );

        let (updates, _) = watch::channel(SessionSnapshot {
            phase: Phase::Idle,
            language: context.language,
            grade: context.grade,
            recordings: Vec::new(),
            response_available: false,
            response_source: None,
            playing: None,
            last_message: None,
        });

        Self {
            config,
            context,
            audio,
            transfer,
            phase: Phase::Idle,
            capture: None,
            recordings: Vec::new(),
            response: None,
            playback: None,
            next_token: 0,
            last_message: None,
            last_error: None,
            updates,
        }
    }

    /// Create a controller and run initialization
    pub async fn create(
        config: ControllerConfig,
        context: SessionContext,
        audio: Box<dyn AudioDevice>,
        transfer: Box<dyn TransferService>,
    ) -> Self {
        let mut controller = Self::new(config, context, audio, transfer);
        controller.initialize().await;
        controller
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn recordings(&self) -> &[RecordingEntry] {
        &self.recordings
    }

    pub fn response(&self) -> Option<&ServerResponse> {
        self.response.as_ref()
    }

    /// Whether a reply is waiting to be played
    pub fn response_available(&self) -> bool {
        self.response.is_some()
    }

    pub fn active_playback(&self) -> Option<ActivePlayback> {
        self.playback
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn last_error(&self) -> Option<&ControllerError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_message(&mut self) {
        self.last_message = None;
        self.last_error = None;
        self.publish();
    }

    /// Watch the session snapshot as it changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            language: self.context.language,
            grade: self.context.grade,
            recordings: self
                .recordings
                .iter()
                .map(|entry| RecordingSummary {
                    index: entry.index,
                    duration: entry.duration_label(),
                    locator: entry.locator.clone(),
                })
                .collect(),
            response_available: self.response_available(),
            response_source: self.response.as_ref().map(|r| r.source.clone()),
            playing: self.playback.map(|p| p.target),
            last_message: self.last_message.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Capture lifecycle
    // ------------------------------------------------------------------

    /// Request microphone access and prepare the first capture channel
    pub async fn initialize(&mut self) {
        match self.phase {
            Phase::Idle | Phase::Error => {}
            Phase::Ready if self.capture.is_some() => {
                debug!("Session already initialized");
                return;
            }
            other => {
                warn!("Initialize rejected while {}", other);
                self.report(ControllerError::Busy(other));
                return;
            }
        }

        self.transition(Phase::Initializing);

        match self.audio.request_permission().await {
            Ok(Permission::Granted) => {}
            Ok(Permission::Denied) => {
                self.transition(Phase::Error);
                self.report(ControllerError::PermissionDenied);
                return;
            }
            Err(e) => {
                self.transition(Phase::Error);
                self.report(ControllerError::DeviceNotReady(format!(
                    "permission request failed: {:#}",
                    e
                )));
                return;
            }
        }

        self.prepare_capture().await;
    }

    /// Begin capturing on the prepared channel
    pub async fn start_recording(&mut self) {
        if self.phase.is_busy() {
            warn!("Start rejected while {}", self.phase);
            self.report(ControllerError::Busy(self.phase));
            return;
        }

        let handle = match self.capture.clone() {
            Some(handle) if self.is_settled() => handle,
            _ => {
                self.report(ControllerError::DeviceNotReady(
                    "capture channel is not prepared".to_string(),
                ));
                return;
            }
        };

        self.stop_playback().await;

        match self.audio.start(&handle).await {
            Ok(()) => self.transition(Phase::Recording),
            Err(e) => self.report(ControllerError::DeviceNotReady(format!(
                "failed to start capture: {:#}",
                e
            ))),
        }
    }

    /// Finalize the capture, log it, and upload it
    pub async fn stop_recording(&mut self) {
        if self.phase != Phase::Recording {
            self.report(ControllerError::DeviceNotReady(
                "no recording in progress".to_string(),
            ));
            return;
        }

        let handle = match self.capture.take() {
            Some(handle) => handle,
            None => {
                self.report(ControllerError::DeviceNotReady(
                    "capture channel was lost".to_string(),
                ));
                self.prepare_capture().await;
                return;
            }
        };

        self.transition(Phase::Stopping);

        let captured = match self.audio.stop(handle).await {
            Ok(captured) => captured,
            Err(e) => {
                self.report(ControllerError::DeviceNotReady(format!(
                    "failed to stop capture: {:#}",
                    e
                )));
                self.prepare_capture().await;
                return;
            }
        };

        let entry = RecordingEntry {
            index: self.recordings.len(),
            locator: captured.path,
            duration_ms: captured.duration_ms,
            recorded_at: Utc::now(),
        };

        info!(
            "Recording {} saved: {} ({})",
            entry.index + 1,
            entry.locator.display(),
            entry.duration_label()
        );

        self.recordings.push(entry.clone());
        self.publish();

        self.transition(Phase::Uploading);

        match self.upload(&entry).await {
            Ok(response) => {
                info!("Response ready ({:?})", response.source);
                self.response = Some(response);
            }
            Err(err) => {
                self.response = None;
                self.transition(Phase::Error);
                self.report(err);
            }
        }

        self.prepare_capture().await;

        if self.phase == Phase::Ready && self.config.auto_play_response {
            if let Some(audio) = self.response.as_ref().map(|r| r.audio.clone()) {
                self.start_playback(PlaybackTarget::Response, audio).await;
            }
        }
    }

    /// Stop any playback, release the capture channel, and discard a capture in progress
    pub async fn shutdown(&mut self) {
        self.stop_playback().await;

        let handle = self.capture.take();
        if self.phase == Phase::Recording {
            if let Some(handle) = handle {
                match self.audio.stop(handle).await {
                    Ok(captured) => info!(
                        "Discarded unfinished recording {}",
                        captured.path.display()
                    ),
                    Err(e) => warn!("Failed to stop capture on shutdown: {:#}", e),
                }
            }
        }

        self.transition(Phase::Idle);
        info!("Lesson session closed ({} recordings)", self.recordings.len());
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Play recording `index`, or stop it if it is the one playing
    pub async fn toggle_recording_playback(&mut self, index: usize) {
        if !self.is_settled() {
            self.report(ControllerError::Busy(self.phase));
            return;
        }

        let audio = match self.recordings.get(index) {
            Some(entry) => entry.audio(),
            None => {
                self.report(ControllerError::PlaybackFailure(format!(
                    "no recording #{}",
                    index + 1
                )));
                return;
            }
        };

        if self.is_active(PlaybackTarget::Recording(index)) {
            self.stop_playback().await;
        } else {
            self.start_playback(PlaybackTarget::Recording(index), audio)
                .await;
        }
    }

    /// Play the latest reply, or stop it if it is playing
    pub async fn toggle_response_playback(&mut self) {
        if !self.is_settled() {
            self.report(ControllerError::Busy(self.phase));
            return;
        }

        let audio = match &self.response {
            Some(response) => response.audio.clone(),
            None => {
                self.report(ControllerError::PlaybackFailure(
                    "no response available".to_string(),
                ));
                return;
            }
        };

        if self.is_active(PlaybackTarget::Response) {
            self.stop_playback().await;
        } else {
            self.start_playback(PlaybackTarget::Response, audio).await;
        }
    }

    /// Stop the active playback; a no-op when nothing is playing
    pub async fn stop_playback(&mut self) {
        let active = match self.playback.take() {
            Some(active) => active,
            None => return,
        };

        if let Err(e) = self.audio.stop_playback(active.token).await {
            self.report(ControllerError::PlaybackFailure(format!(
                "failed to stop playback: {:#}",
                e
            )));
        }

        if self.phase.is_playing() {
            self.transition(Phase::Ready);
        }
    }

    /// Apply a notification from the audio device
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Finished(token) => {
                if self.playback.map(|p| p.token) != Some(token) {
                    debug!("Ignoring finish of stale playback {:?}", token);
                    return;
                }

                info!("Playback {:?} finished", token);
                self.playback = None;
                if self.phase.is_playing() {
                    self.transition(Phase::Ready);
                }
            }
        }
    }

    /// Save the latest reply's audio to `dest`
    pub async fn export_response(&mut self, dest: &Path) {
        let audio = match &self.response {
            Some(response) => response.audio.clone(),
            None => {
                self.report(ControllerError::TransferFailure(
                    "no response to save".to_string(),
                ));
                return;
            }
        };

        let result = async {
            let bytes = audio.read().await?;
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, &bytes).await?;
            anyhow::Ok(bytes.len())
        }
        .await;

        match result {
            Ok(len) => info!("Response saved to {} ({} bytes)", dest.display(), len),
            Err(e) => self.report(ControllerError::TransferFailure(format!(
                "failed to save response to {}: {:#}",
                dest.display(),
                e
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition(&mut self, next: Phase) {
        if self.phase != next {
            info!("Session phase: {} -> {}", self.phase, next);
        }
        self.phase = next;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    fn report(&mut self, err: ControllerError) {
        if err.is_recoverable() {
            warn!("{}", err);
        } else {
            error!("{}", err);
        }
        self.last_message = Some(err.user_message());
        self.last_error = Some(err);
        self.publish();
    }

    fn is_settled(&self) -> bool {
        matches!(
            self.phase,
            Phase::Ready | Phase::PlayingLocal | Phase::PlayingResponse
        )
    }

    fn is_active(&self, target: PlaybackTarget) -> bool {
        self.playback.map(|p| p.target) == Some(target)
    }

    async fn prepare_capture(&mut self) {
        match self.audio.prepare(&self.config.encoding).await {
            Ok(handle) => {
                debug!("Capture channel {} prepared", handle.id());
                self.capture = Some(handle);
                self.transition(Phase::Ready);
            }
            Err(e) => {
                self.capture = None;
                self.transition(Phase::Error);
                self.report(ControllerError::DeviceNotReady(format!(
                    "failed to prepare capture: {:#}",
                    e
                )));
            }
        }
    }

    async fn start_playback(&mut self, target: PlaybackTarget, audio: AudioRef) {
        self.stop_playback().await;

        let token = PlaybackToken(self.next_token);
        self.next_token += 1;

        match self.audio.play(token, &audio).await {
            Ok(()) => {
                self.playback = Some(ActivePlayback { token, target });
                self.transition(match target {
                    PlaybackTarget::Recording(_) => Phase::PlayingLocal,
                    PlaybackTarget::Response => Phase::PlayingResponse,
                });
            }
            Err(e) => self.report(ControllerError::PlaybackFailure(format!("{:#}", e))),
        }
    }

    async fn upload(&self, entry: &RecordingEntry) -> Result<ServerResponse, ControllerError> {
        let request = UploadRequest {
            language: self.context.language,
            grade: self.context.grade,
            attachment: AudioAttachment {
                path: entry.locator.clone(),
                file_name: self.config.encoding.file_name(),
                mime: self.config.encoding.format.mime_type().to_string(),
            },
        };

        let limit = self.config.transfer_timeout;

        let reply = match tokio::time::timeout(limit, self.transfer.upload(&request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(ControllerError::TransferFailure(format!("{:#}", e))),
            Err(_) => {
                return Err(ControllerError::TransferFailure(format!(
                    "upload timed out after {:?}",
                    limit
                )))
            }
        };

        match self.config.response_mode.interpret(reply)? {
            ResponsePayload::Audio(bytes) => Ok(ServerResponse {
                audio: self.store_inline(bytes).await?,
                source: ResponseSource::Inline,
                received_at: Utc::now(),
            }),
            ResponsePayload::Url(url) => {
                let path = match tokio::time::timeout(limit, self.transfer.download(&url)).await {
                    Ok(Ok(path)) => path,
                    Ok(Err(e)) => {
                        return Err(ControllerError::TransferFailure(format!("{:#}", e)))
                    }
                    Err(_) => {
                        return Err(ControllerError::TransferFailure(format!(
                            "download timed out after {:?}",
                            limit
                        )))
                    }
                };

                Ok(ServerResponse {
                    audio: AudioRef::File(path),
                    source: ResponseSource::Downloaded { url },
                    received_at: Utc::now(),
                })
            }
        }
    }

    async fn store_inline(&self, bytes: Vec<u8>) -> Result<AudioRef, ControllerError> {
        if !self.config.persist_responses {
            return Ok(AudioRef::Buffer(Arc::new(bytes)));
        }

        let dir = &self.config.responses_dir;
        let path = dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));

        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Response stored at {}", path.display());
                Ok(AudioRef::File(path))
            }
            Err(e) => Err(ControllerError::TransferFailure(format!(
                "failed to store response: {}",
                e
            ))),
        }
    }
}
