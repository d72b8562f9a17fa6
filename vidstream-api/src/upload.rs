use crate::client::{bearer, Client};
use crate::error::{ApiError, ApiResult};
use crate::query::QueryParams;
use bytes::Bytes;
use futures::{stream, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Default upper bound for [`Client::upload_file`]
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory file ready to be sent as a multipart part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Other(format!("Failed to read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let content_type = guess_content_type(&file_name);
        Ok(Self::new(file_name, content_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub(crate) fn to_part(&self) -> ApiResult<Part> {
        let body = Body::from(self.data.clone());
        self.wrap_part(Part::stream_with_length(body, self.size()))
    }

    fn to_part_with_progress(&self, on_progress: OnUploadProgress) -> ApiResult<Part> {
        let total = self.size();
        let chunks: Vec<Bytes> = (0..self.data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| self.data.slice(start..(start + CHUNK_SIZE).min(self.data.len())))
            .collect();

        let mut sent = 0u64;
        let mut last_reported = None;
        let progress = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            let percent = ((sent as f64 / total as f64) * 100.0).round() as u8;
            if last_reported != Some(percent) {
                last_reported = Some(percent);
                on_progress(percent);
            }
            Ok::<Bytes, std::io::Error>(chunk)
        });

        self.wrap_part(Part::stream_with_length(Body::wrap_stream(progress), total))
    }

    fn wrap_part(&self, part: Part) -> ApiResult<Part> {
        part.file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| ApiError::validation("content type", e.to_string()))
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Receives integer upload progress in `0..=100`
pub type OnUploadProgress = Arc<dyn Fn(u8) + Send + Sync>;

/// Options of [`Client::upload_file`]
#[derive(Clone)]
pub struct UploadOptions {
    pub on_progress: Option<OnUploadProgress>,
    /// Extra form fields sent next to the file
    pub additional_data: QueryParams,
    pub max_size: u64,
    /// Accepted MIME types; any type when `None`
    pub allowed_types: Option<Vec<String>>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            on_progress: None,
            additional_data: QueryParams::new(),
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_types: None,
        }
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn with_additional_data(mut self, data: QueryParams) -> Self {
        self.additional_data = data;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Check size and type before anything is sent
    pub fn validate(&self, file: &UploadFile) -> ApiResult<()> {
        if file.size() > self.max_size {
            let megabytes = (self.max_size as f64 / 1024.0 / 1024.0).round() as u64;
            return Err(ApiError::validation(
                "file",
                format!("File size must not exceed {}MB", megabytes),
            ));
        }
        if let Some(allowed) = &self.allowed_types {
            if !allowed.iter().any(|t| *t == file.content_type) {
                return Err(ApiError::validation(
                    "file",
                    format!("Unsupported file type: {}", file.content_type),
                ));
            }
        }
        Ok(())
    }
}

impl Client {
    /// Upload a single file with size and type checks and progress reporting.
    ///
    /// Runs under the upload timeout and never refreshes the session. A JSON
    /// reply is returned parsed, any other reply as a string value.
    pub async fn upload_file(
        &self,
        endpoint: &str,
        file: UploadFile,
        options: UploadOptions,
    ) -> ApiResult<Value> {
        options.validate(&file)?;

        let part = match &options.on_progress {
            Some(on_progress) => file.to_part_with_progress(on_progress.clone())?,
            None => file.to_part()?,
        };
        let mut form = Form::new().part("file", part);
        for (key, value) in options.additional_data.iter() {
            form = form.text(key.to_string(), value.to_string());
        }

        let url = self.build_url(endpoint);
        let mut request = self.http_client.post(&url).multipart(form);
        if let Some(token) = self.tokens().get_access_token() {
            request = request.header(AUTHORIZATION, bearer(&token)?);
        }

        tracing::info!(
            target: "api::upload",
            url = %url,
            file_name = %file.file_name,
            size = file.size(),
            "Uploading file"
        );

        let response = match tokio::time::timeout(self.config().upload_timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(target: "api::upload", url = %url, error = %err, "Upload failed");
                return Err(ApiError::Network(
                    "Upload failed, please check the network connection".to_string(),
                ));
            }
            Err(_) => {
                tracing::warn!(target: "api::upload", url = %url, "Upload timed out");
                return Err(ApiError::Timeout);
            }
        };

        let status = response.status();
        let body = response.bytes().await.map_err(|_| {
            ApiError::Network("Upload failed, please check the network connection".to_string())
        })?;

        if !status.is_success() {
            return Err(ApiError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                &body,
            ));
        }

        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(size: usize) -> UploadFile {
        UploadFile::new("cover.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn oversized_file_is_rejected() {
        let err = UploadOptions::new()
            .with_max_size(1024 * 1024)
            .validate(&png(1024 * 1024 + 1))
            .unwrap_err();
        match err {
            ApiError::Validation { message, .. } => {
                assert_eq!(message, "File size must not exceed 1MB")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(UploadOptions::new().validate(&png(1024 * 1024)).is_ok());
    }

    #[test]
    fn unlisted_type_is_rejected() {
        let options = UploadOptions::new().with_allowed_types(["image/jpeg", "image/webp"]);
        let err = options.validate(&png(10)).unwrap_err();
        assert!(err.to_string().ends_with("Unsupported file type: image/png"));

        let options = options.with_allowed_types(["image/png"]);
        assert!(options.validate(&png(10)).is_ok());
    }

    #[test]
    fn content_type_is_guessed_from_extension() {
        assert_eq!(guess_content_type("avatar.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("clip.mp4"), "video/mp4");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.webp");
        tokio::fs::write(&path, b"RIFF").await.unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "poster.webp");
        assert_eq!(file.content_type, "image/webp");
        assert_eq!(file.size(), 4);
    }
}
