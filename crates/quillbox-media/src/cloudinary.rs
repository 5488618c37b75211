//! Cloudinary upload backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use quillbox_core::{Error, Result};

use crate::{validate_format, MediaConfig, MediaStorage, StoredMedia, ALLOWED_FORMATS};

/// Base URL of the upload API.
pub const UPLOAD_URL_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Timeout for upload requests (seconds).
pub const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Cloudinary media backend.
///
/// Uploads go to the unauthenticated-upload endpoint with a signed parameter
/// set; the provider enforces the `allowed_formats` list a second time on
/// its side.
pub struct CloudinaryStorage {
    client: Client,
    config: MediaConfig,
}

impl CloudinaryStorage {
    /// Create a new backend from an explicit configuration.
    pub fn new(config: MediaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            subsystem = "media",
            component = "cloudinary",
            cloud_name = %config.cloud_name,
            folder = %config.folder,
            "Initializing media backend"
        );

        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", UPLOAD_URL_BASE, self.config.cloud_name)
    }

    /// Sign an upload parameter set.
    ///
    /// Parameters are sorted by key, serialized as `k=v` pairs joined with
    /// `&`, the API secret is appended, and the whole string is SHA-256
    /// hashed (the request carries `signature_algorithm=sha256`).
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<(&str, &str)> = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredMedia> {
        validate_format(filename)?;

        let size_bytes = data.len();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let allowed = ALLOWED_FORMATS.join(",");

        let params = [
            ("allowed_formats", allowed.as_str()),
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = self.sign(&params);

        let part = multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| Error::Upload(format!("invalid content type {:?}: {}", content_type, e)))?;

        let form = multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("allowed_formats", allowed)
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);

        debug!(
            subsystem = "media",
            component = "cloudinary",
            op = "upload",
            filename = %filename,
            size_bytes,
            "Uploading media"
        );

        let response = self.client.post(self.upload_url()).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "provider rejected upload ({}): {}",
                status, body
            )));
        }

        let body: UploadResponse = response.json().await?;

        info!(
            subsystem = "media",
            component = "cloudinary",
            op = "uploaded",
            public_id = %body.public_id,
            size_bytes,
            "Media stored"
        );

        Ok(StoredMedia {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }
}
