// Headless audio device backed by files

use anyhow::{bail, Context, Result};
use hound::{WavReader, WavWriter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::device::{
    AudioDevice, AudioRef, CaptureHandle, CapturedAudio, Permission, PlaybackEvent,
    PlaybackEventSender, PlaybackToken,
};
use super::encoding::{AudioEncoding, AudioFormat};
use super::probe::audio_duration_ms;

/// A WAV clip loaded into memory
pub struct AudioFile {
    pub path: String,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_ms =
            samples.len() as u64 * 1000 / (spec.sample_rate as u64 * spec.channels as u64);

        info!(
            "Audio file loaded: {}ms, {}Hz, {} channels, {} samples",
            duration_ms,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_ms,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Write the clip as a 16-bit PCM WAV file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;
        for &sample in &self.samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(())
    }
}

/// Configuration for the file-backed device
#[derive(Debug, Clone)]
pub struct FileDeviceConfig {
    /// WAV clip that stands in for the microphone
    pub source_clip: PathBuf,
    /// Directory captures are written to
    pub recordings_dir: PathBuf,
    /// Answer to permission requests
    pub permission: Permission,
}

impl FileDeviceConfig {
    pub fn new(source_clip: PathBuf, recordings_dir: PathBuf) -> Self {
        Self {
            source_clip,
            recordings_dir,
            permission: Permission::Granted,
        }
    }
}

/// Audio device that replays a WAV clip as the microphone
///
/// Playback is not audible: the device decodes the audio length and reports
/// `PlaybackEvent::Finished` once that much time has passed.
pub struct FileAudioDevice {
    config: FileDeviceConfig,
    events: PlaybackEventSender,
    capturing: Option<CaptureHandle>,
    playing: HashMap<PlaybackToken, JoinHandle<()>>,
}

impl FileAudioDevice {
    pub fn new(config: FileDeviceConfig, events: PlaybackEventSender) -> Self {
        Self {
            config,
            events,
            capturing: None,
            playing: HashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl AudioDevice for FileAudioDevice {
    async fn request_permission(&mut self) -> Result<Permission> {
        info!("Microphone permission: {:?}", self.config.permission);
        Ok(self.config.permission)
    }

    async fn prepare(&mut self, encoding: &AudioEncoding) -> Result<CaptureHandle> {
        if encoding.format != AudioFormat::Wav {
            bail!(
                "{} only records WAV, got {}",
                self.name(),
                encoding.format.extension()
            );
        }
        if !self.config.source_clip.exists() {
            bail!("Source clip not found: {}", self.config.source_clip.display());
        }

        tokio::fs::create_dir_all(&self.config.recordings_dir)
            .await
            .context("Failed to create recordings directory")?;

        Ok(CaptureHandle::new(encoding.clone()))
    }

    async fn start(&mut self, handle: &CaptureHandle) -> Result<()> {
        if self.capturing.is_some() {
            bail!("Already capturing");
        }

        info!("Capture {} started from {}", handle.id(), self.config.source_clip.display());
        self.capturing = Some(handle.clone());

        Ok(())
    }

    async fn stop(&mut self, handle: CaptureHandle) -> Result<CapturedAudio> {
        match self.capturing.take() {
            Some(active) if active.id() == handle.id() => {}
            Some(active) => {
                self.capturing = Some(active);
                bail!("Capture {} is not the active capture", handle.id());
            }
            None => bail!("Capture {} was never started", handle.id()),
        }

        let source = self.config.source_clip.clone();
        let path = self
            .config
            .recordings_dir
            .join(format!("{}.{}", handle.id(), handle.encoding().format.extension()));
        let target = path.clone();

        let duration_ms = tokio::task::spawn_blocking(move || -> Result<u64> {
            let clip = AudioFile::open(&source)?;
            clip.write_to(&target)?;
            Ok(clip.duration_ms)
        })
        .await
        .context("Capture writer panicked")??;

        info!("Capture {} stopped: {} ({}ms)", handle.id(), path.display(), duration_ms);

        Ok(CapturedAudio { path, duration_ms })
    }

    async fn play(&mut self, token: PlaybackToken, audio: &AudioRef) -> Result<()> {
        let duration_ms = audio_duration_ms(audio).await?;
        let events = self.events.clone();

        info!("Playback {:?} started ({}ms)", token, duration_ms);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            if events.send(PlaybackEvent::Finished(token)).is_err() {
                warn!("Playback {:?} finished with no listener", token);
            }
        });

        self.playing.retain(|_, task| !task.is_finished());
        self.playing.insert(token, timer);

        Ok(())
    }

    async fn stop_playback(&mut self, token: PlaybackToken) -> Result<()> {
        if let Some(timer) = self.playing.remove(&token) {
            timer.abort();
            info!("Playback {:?} stopped", token);
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "file device"
    }
}
