//! Transfer service: uploads captures to the tutor endpoint and fetches replies

pub mod client;
pub mod messages;

use anyhow::Result;
use std::path::PathBuf;

pub use client::HttpTransfer;
pub use messages::{
    AudioAttachment, AudioUrlReply, ResponseMode, ResponsePayload, UploadReply, UploadRequest,
};

/// Network collaborator used by the lifecycle controller
#[async_trait::async_trait]
pub trait TransferService: Send + Sync {
    /// Send one multipart upload and return the raw reply
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReply>;

    /// Fetch audio at `url` into local storage
    async fn download(&self, url: &str) -> Result<PathBuf>;

    /// Get service name for logging
    fn name(&self) -> &str;
}
