// Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_tutor::audio::{
    AudioDevice, AudioEncoding, AudioRef, CaptureHandle, CapturedAudio, Permission, PlaybackToken,
};
use voice_tutor::lesson::{Grade, Language, SessionContext};
use tokio::sync::watch;
use voice_tutor::session::{ControllerConfig, LessonController, Phase, SessionSnapshot};
use voice_tutor::transfer::{ResponseMode, TransferService, UploadReply, UploadRequest};

// ============================================================================
// Audio device
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    RequestPermission,
    Prepare,
    Start,
    Stop,
    Play(PlaybackToken, AudioRef),
    StopPlayback(PlaybackToken),
}

/// Knobs a test can flip while the controller owns the device
#[derive(Debug, Default)]
pub struct DeviceScript {
    pub deny_permission: bool,
    pub fail_prepare: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub fail_play: bool,
    /// Durations handed out by successive stops (default 1000ms)
    pub durations_ms: VecDeque<u64>,
}

#[derive(Clone, Default)]
pub struct DeviceProbe {
    pub script: Arc<Mutex<DeviceScript>>,
    calls: Arc<Mutex<Vec<DeviceCall>>>,
    max_concurrent_playbacks: Arc<Mutex<usize>>,
}

impl DeviceProbe {
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn max_concurrent_playbacks(&self) -> usize {
        *self.max_concurrent_playbacks.lock().unwrap()
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, DeviceScript> {
        self.script.lock().unwrap()
    }
}

pub struct FakeAudioDevice {
    probe: DeviceProbe,
    recordings_dir: PathBuf,
    capturing: Option<CaptureHandle>,
    playing: HashSet<PlaybackToken>,
}

impl FakeAudioDevice {
    pub fn new() -> (Self, DeviceProbe) {
        let probe = DeviceProbe::default();
        let device = Self {
            probe: probe.clone(),
            recordings_dir: PathBuf::from("/tmp/voice-tutor-tests"),
            capturing: None,
            playing: HashSet::new(),
        };
        (device, probe)
    }

    fn record(&self, call: DeviceCall) {
        self.probe.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl AudioDevice for FakeAudioDevice {
    async fn request_permission(&mut self) -> Result<Permission> {
        self.record(DeviceCall::RequestPermission);
        if self.probe.script().deny_permission {
            Ok(Permission::Denied)
        } else {
            Ok(Permission::Granted)
        }
    }

    async fn prepare(&mut self, encoding: &AudioEncoding) -> Result<CaptureHandle> {
        self.record(DeviceCall::Prepare);
        if self.probe.script().fail_prepare {
            bail!("prepare failed");
        }
        Ok(CaptureHandle::new(encoding.clone()))
    }

    async fn start(&mut self, handle: &CaptureHandle) -> Result<()> {
        self.record(DeviceCall::Start);
        if self.probe.script().fail_start {
            bail!("start failed");
        }
        if self.capturing.is_some() {
            bail!("Already capturing");
        }
        self.capturing = Some(handle.clone());
        Ok(())
    }

    async fn stop(&mut self, handle: CaptureHandle) -> Result<CapturedAudio> {
        self.record(DeviceCall::Stop);
        self.capturing = None;
        let (fail, duration_ms) = {
            let mut script = self.probe.script();
            (script.fail_stop, script.durations_ms.pop_front().unwrap_or(1000))
        };
        if fail {
            bail!("stop failed");
        }
        Ok(CapturedAudio {
            path: self.recordings_dir.join(format!("{}.wav", handle.id())),
            duration_ms,
        })
    }

    async fn play(&mut self, token: PlaybackToken, audio: &AudioRef) -> Result<()> {
        self.record(DeviceCall::Play(token, audio.clone()));
        if self.probe.script().fail_play {
            bail!("speaker unavailable");
        }
        self.playing.insert(token);
        let mut max = self.probe.max_concurrent_playbacks.lock().unwrap();
        *max = (*max).max(self.playing.len());
        Ok(())
    }

    async fn stop_playback(&mut self, token: PlaybackToken) -> Result<()> {
        self.record(DeviceCall::StopPlayback(token));
        self.playing.remove(&token);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake device"
    }
}

// ============================================================================
// Transfer service
// ============================================================================

pub enum Scripted<T> {
    Ok(T),
    Fail(String),
    Hang,
}

#[derive(Clone, Default)]
pub struct TransferProbe {
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
    downloads: Arc<Mutex<Vec<String>>>,
    upload_script: Arc<Mutex<VecDeque<Scripted<UploadReply>>>>,
    download_script: Arc<Mutex<VecDeque<Scripted<PathBuf>>>>,
    session: Arc<Mutex<Option<watch::Receiver<SessionSnapshot>>>>,
    /// Phase and log length the session showed when each upload began
    seen_at_upload: Arc<Mutex<Vec<(Phase, usize)>>>,
}

impl TransferProbe {
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn push_reply(&self, reply: Scripted<UploadReply>) {
        self.upload_script.lock().unwrap().push_back(reply);
    }

    pub fn push_download(&self, download: Scripted<PathBuf>) {
        self.download_script.lock().unwrap().push_back(download);
    }

    pub fn watch_session(&self, session: watch::Receiver<SessionSnapshot>) {
        *self.session.lock().unwrap() = Some(session);
    }

    pub fn seen_at_upload(&self) -> Vec<(Phase, usize)> {
        self.seen_at_upload.lock().unwrap().clone()
    }
}

pub struct FakeTransfer {
    probe: TransferProbe,
}

impl FakeTransfer {
    pub fn new() -> (Self, TransferProbe) {
        let probe = TransferProbe::default();
        (
            Self {
                probe: probe.clone(),
            },
            probe,
        )
    }
}

async fn resolve<T>(next: Option<Scripted<T>>, what: &str) -> Result<T> {
    match next {
        Some(Scripted::Ok(value)) => Ok(value),
        Some(Scripted::Fail(reason)) => bail!("{}", reason),
        Some(Scripted::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            bail!("{} never finished", what)
        }
        None => bail!("no scripted {}", what),
    }
}

#[async_trait::async_trait]
impl TransferService for FakeTransfer {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReply> {
        self.probe.uploads.lock().unwrap().push(request.clone());
        let seen = {
            let session = self.probe.session.lock().unwrap();
            session.as_ref().map(|rx| {
                let snapshot = rx.borrow();
                (snapshot.phase, snapshot.recordings.len())
            })
        };
        if let Some(seen) = seen {
            self.probe.seen_at_upload.lock().unwrap().push(seen);
        }
        let next = self.probe.upload_script.lock().unwrap().pop_front();
        resolve(next, "upload").await
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        self.probe.downloads.lock().unwrap().push(url.to_string());
        let next = self.probe.download_script.lock().unwrap().pop_front();
        resolve(next, "download").await
    }

    fn name(&self) -> &str {
        "fake transfer"
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn audio_reply(bytes: &[u8]) -> UploadReply {
    UploadReply {
        status: 200,
        content_type: Some("audio/mpeg".to_string()),
        body: bytes.to_vec(),
    }
}

pub fn json_reply(json: &str) -> UploadReply {
    UploadReply {
        status: 200,
        content_type: Some("application/json".to_string()),
        body: json.as_bytes().to_vec(),
    }
}

pub fn test_context() -> SessionContext {
    SessionContext::new(Language::Sinhala, Grade::new(7).unwrap())
}

pub fn test_config(mode: ResponseMode) -> ControllerConfig {
    ControllerConfig {
        response_mode: mode,
        transfer_timeout: Duration::from_millis(200),
        ..ControllerConfig::default()
    }
}

pub struct Harness {
    pub controller: LessonController,
    pub device: DeviceProbe,
    pub transfer: TransferProbe,
}

/// Controller built over fresh fakes, not yet initialized
pub fn harness(config: ControllerConfig) -> Harness {
    let (device, device_probe) = FakeAudioDevice::new();
    let (transfer, transfer_probe) = FakeTransfer::new();
    let controller = LessonController::new(
        config,
        test_context(),
        Box::new(device),
        Box::new(transfer),
    );
    transfer_probe.watch_session(controller.subscribe());
    Harness {
        controller,
        device: device_probe,
        transfer: transfer_probe,
    }
}

/// Controller initialized to `Ready`
pub async fn ready_harness(config: ControllerConfig) -> Harness {
    let mut h = harness(config);
    h.controller.initialize().await;
    h
}

/// Record one clip of `duration_ms` and let the scripted reply answer it
pub async fn record_once(h: &mut Harness, duration_ms: u64, reply: Scripted<UploadReply>) {
    h.device.script().durations_ms.push_back(duration_ms);
    h.transfer.push_reply(reply);
    h.controller.start_recording().await;
    h.controller.stop_recording().await;
}
