use anyhow::{bail, Context, Result};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::messages::{UploadReply, UploadRequest};
use super::TransferService;

/// Transfer service speaking HTTP to the tutor endpoint
pub struct HttpTransfer {
    client: reqwest::Client,
    endpoint: String,
    download_dir: PathBuf,
}

impl HttpTransfer {
    pub fn new(endpoint: impl Into<String>, download_dir: PathBuf, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            download_dir,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn download_path(&self, url: &str) -> PathBuf {
        let ext = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)))
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| "mp3".to_string());

        self.download_dir.join(format!("{}.{}", uuid::Uuid::new_v4(), ext))
    }
}

#[async_trait::async_trait]
impl TransferService for HttpTransfer {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReply> {
        let audio = tokio::fs::read(&request.attachment.path)
            .await
            .with_context(|| {
                format!(
                    "Failed to read capture {}",
                    request.attachment.path.display()
                )
            })?;

        info!(
            "Uploading {} ({} bytes, language={}, grade={}) to {}",
            request.attachment.file_name,
            audio.len(),
            request.language,
            request.grade,
            self.endpoint
        );

        let part = Part::bytes(audio)
            .file_name(request.attachment.file_name.clone())
            .mime_str(&request.attachment.mime)
            .context("Invalid attachment MIME type")?;

        let form = Form::new()
            .text("language", request.language.to_string())
            .text("grade", request.grade.to_string())
            .part("audio", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "audio/mpeg")
            .multipart(form)
            .send()
            .await
            .context("Upload request failed")?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .context("Failed to read upload reply")?
            .to_vec();

        info!(
            "Upload reply: status={}, content-type={:?}, {} bytes",
            status,
            content_type,
            body.len()
        );

        Ok(UploadReply {
            status,
            content_type,
            body,
        })
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        info!("Downloading response audio from {}", url);

        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "audio/mpeg")
            .send()
            .await
            .context("Download request failed")?;

        if !resp.status().is_success() {
            bail!("Download of {} failed with status {}", url, resp.status());
        }

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .context("Failed to create download directory")?;

        let path = self.download_path(url);
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut written = 0usize;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            file.write_all(&chunk)
                .await
                .context("Failed to write downloaded audio")?;
            written += chunk.len();
        }
        file.flush().await?;

        info!("Downloaded {} bytes to {}", written, path.display());

        Ok(path)
    }

    fn name(&self) -> &str {
        "http"
    }
}
