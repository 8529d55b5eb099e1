// Audio length detection for timed playback

use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::device::AudioRef;

/// Decode the container headers (and packets when needed) to find the audio length
pub async fn audio_duration_ms(audio: &AudioRef) -> Result<u64> {
    match audio {
        AudioRef::File(path) => {
            let path = path.clone();
            tokio::task::spawn_blocking(move || probe_file(&path))
                .await
                .context("Probe task panicked")?
        }
        AudioRef::Buffer(bytes) => {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || {
                probe_source(Box::new(Cursor::new(bytes.to_vec())), Hint::new())
            })
            .await
            .context("Probe task panicked")?
        }
    }
}

fn probe_file(path: &Path) -> Result<u64> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    probe_source(Box::new(file), hint)
}

fn probe_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<u64> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unrecognized audio format")?;

    let mut format = probed.format;
    let track = format.default_track().context("Audio has no tracks")?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params.sample_rate.context("Audio has no sample rate")? as u64;

    if let Some(frames) = params.n_frames {
        return Ok(frames * 1000 / sample_rate);
    }

    // No frame count in the headers (e.g. MP3 without a Xing tag): sum packet durations
    let mut frames = 0u64;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            frames += packet.dur;
        }
    }

    Ok(frames * 1000 / sample_rate)
}
