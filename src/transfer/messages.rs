use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ControllerError;
use crate::lesson::{Grade, Language};

/// Multipart upload sent to the tutor service
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub language: Language,
    pub grade: Grade,
    pub attachment: AudioAttachment,
}

/// The `audio` file part of an upload
#[derive(Debug, Clone)]
pub struct AudioAttachment {
    /// Local file holding the capture
    pub path: PathBuf,
    /// File name sent with the part (e.g. "recording.m4a")
    pub file_name: String,
    /// MIME type of the part
    pub mime: String,
}

/// Raw reply to an upload
#[derive(Debug, Clone)]
pub struct UploadReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl UploadReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    fn is_audio(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.starts_with("audio/") || ct.starts_with("application/octet-stream")
            })
            .unwrap_or(false)
    }
}

/// JSON reply carrying the location of the response audio
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioUrlReply {
    pub audio_url: String,
}

/// How the tutor service returns its audio; fixed per session
///
/// Relays that answer with `{"filename": ...}` and serve the audio from
/// `GET <endpoint>?filename=...` are not supported. Have the relay return the
/// full URL and use `UrlJson`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// The reply body is the audio itself
    #[default]
    Binary,
    /// The reply is `{"audioUrl": "..."}` pointing at the audio
    UrlJson,
}

/// Audio carried by a successful reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Audio(Vec<u8>),
    Url(String),
}

impl ResponseMode {
    /// Validate a reply against this mode
    ///
    /// A reply shaped for the other mode is rejected, never reinterpreted.
    pub fn interpret(&self, reply: UploadReply) -> Result<ResponsePayload, ControllerError> {
        if !reply.is_success() {
            return Err(ControllerError::TransferFailure(format!(
                "server answered with status {}",
                reply.status
            )));
        }

        match self {
            ResponseMode::Binary => {
                if reply.is_json() || looks_like_json_object(&reply.body) {
                    return Err(ControllerError::MalformedResponse(
                        "expected binary audio, got JSON".to_string(),
                    ));
                }
                if reply.body.is_empty() {
                    return Err(ControllerError::MalformedResponse(
                        "reply carried no audio".to_string(),
                    ));
                }
                Ok(ResponsePayload::Audio(reply.body))
            }
            ResponseMode::UrlJson => {
                if reply.is_audio() {
                    return Err(ControllerError::MalformedResponse(
                        "expected JSON with audioUrl, got binary audio".to_string(),
                    ));
                }
                let parsed: AudioUrlReply = serde_json::from_slice(&reply.body).map_err(|e| {
                    ControllerError::MalformedResponse(format!(
                        "expected JSON with audioUrl: {}",
                        e
                    ))
                })?;
                if parsed.audio_url.trim().is_empty() {
                    return Err(ControllerError::MalformedResponse(
                        "audioUrl is empty".to_string(),
                    ));
                }
                Ok(ResponsePayload::Url(parsed.audio_url))
            }
        }
    }
}

fn looks_like_json_object(body: &[u8]) -> bool {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    first == Some(&b'{') && serde_json::from_slice::<serde_json::Value>(body).is_ok()
}
