use serde::{Deserialize, Serialize};

/// Container format of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG-4 audio (AAC)
    M4a,
    /// 3GPP audio (AMR)
    ThreeGp,
    /// 16-bit PCM WAV
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::M4a => "m4a",
            AudioFormat::ThreeGp => "3gp",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::M4a => "audio/m4a",
            AudioFormat::ThreeGp => "audio/3gpp",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// Capture encoding options handed to the audio device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEncoding {
    pub format: AudioFormat,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Target bit rate in bits per second
    pub bit_rate: u32,
}

impl AudioEncoding {
    /// Attachment file name used for uploads
    pub fn file_name(&self) -> String {
        format!("recording.{}", self.format.extension())
    }
}

/// Named encoding presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPreset {
    HighQuality,
    LowQuality,
    #[default]
    Wav16k,
}

impl EncodingPreset {
    pub fn encoding(&self) -> AudioEncoding {
        match self {
            EncodingPreset::HighQuality => AudioEncoding {
                format: AudioFormat::M4a,
                sample_rate: 44100,
                channels: 2,
                bit_rate: 128_000,
            },
            EncodingPreset::LowQuality => AudioEncoding {
                format: AudioFormat::ThreeGp,
                sample_rate: 44100,
                channels: 2,
                bit_rate: 64_000,
            },
            EncodingPreset::Wav16k => AudioEncoding {
                format: AudioFormat::Wav,
                sample_rate: 16000,
                channels: 1,
                bit_rate: 256_000,
            },
        }
    }
}

impl From<EncodingPreset> for AudioEncoding {
    fn from(preset: EncodingPreset) -> Self {
        preset.encoding()
    }
}
