pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod lesson;
pub mod session;
pub mod transfer;

pub use audio::{
    AudioDevice, AudioEncoding, AudioFile, AudioFormat, AudioRef, CaptureHandle, CapturedAudio,
    EncodingPreset, FileAudioDevice, FileDeviceConfig, Permission, PlaybackEvent, PlaybackToken,
};
pub use config::Config;
pub use error::{ControllerError, LessonError};
pub use http::{create_router, AppState};
pub use lesson::{Grade, Language, SessionContext};
pub use session::{
    format_duration, ControllerConfig, LessonController, Phase, PlaybackTarget, RecordingEntry,
    ServerResponse, SessionSnapshot,
};
pub use transfer::{HttpTransfer, ResponseMode, TransferService, UploadReply, UploadRequest};
