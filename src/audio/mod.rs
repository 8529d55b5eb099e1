pub mod device;
pub mod encoding;
pub mod file;
pub mod probe;

pub use device::{
    AudioDevice, AudioRef, CaptureHandle, CapturedAudio, Permission, PlaybackEvent,
    PlaybackEventReceiver, PlaybackEventSender, PlaybackToken,
};
pub use encoding::{AudioEncoding, AudioFormat, EncodingPreset};
pub use file::{AudioFile, FileAudioDevice, FileDeviceConfig};
pub use probe::audio_duration_ms;
