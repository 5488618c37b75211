//! # quillbox-media
//!
//! Client for the external media-storage collaborator.
//!
//! Notes never hold binary content; an uploaded image lives with the
//! provider and only the returned URL is persisted. This crate provides the
//! [`MediaStorage`] seam, the Cloudinary-backed implementation, and a mock
//! for tests.

pub mod cloudinary;
pub mod mock;

use async_trait::async_trait;

use quillbox_core::{Error, Result};

pub use cloudinary::CloudinaryStorage;
pub use mock::{MockMediaStorage, RecordedUpload};

/// Formats the provider is allowed to accept.
pub const ALLOWED_FORMATS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// Default provider folder for note uploads.
pub const DEFAULT_FOLDER: &str = "notes";

/// Credentials and upload options for the media provider.
///
/// Constructed explicitly at startup and handed to the backend; no ambient
/// globals.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Provider-side folder uploads land in.
    pub folder: String,
}

impl MediaConfig {
    /// Create a config from the credential triplet, with the default folder.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: DEFAULT_FOLDER.to_string(),
        }
    }

    /// Override the provider folder.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }
}

/// A stored media object as reported by the provider.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Retrievable URL; this is what gets persisted on the note.
    pub url: String,
    /// Provider-side identifier of the object.
    pub public_id: String,
}

/// Upload seam for the media provider.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload one binary and return its stored location.
    async fn upload(&self, filename: &str, content_type: &str, data: Vec<u8>)
        -> Result<StoredMedia>;
}

/// Check a filename against the allowed upload formats.
///
/// Returns the lowercased extension. The same gate runs client-side in every
/// backend and is also passed to the provider, which enforces it again.
pub fn validate_format(filename: &str) -> Result<String> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(Error::Upload(format!(
            "format not allowed for upload: {:?}",
            filename
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_format_accepts_allowed_extensions() {
        for name in ["a.jpg", "b.jpeg", "c.png", "d.pdf", "shouty.PNG", "x.y.jpg"] {
            assert!(validate_format(name).is_ok(), "{} should be allowed", name);
        }
    }

    #[test]
    fn test_validate_format_lowercases_extension() {
        assert_eq!(validate_format("receipt.JPG").unwrap(), "jpg");
    }

    #[test]
    fn test_validate_format_rejects_everything_else() {
        for name in ["a.gif", "b.svg", "c.exe", "noext", "trailing."] {
            let err = validate_format(name).unwrap_err();
            assert!(matches!(err, Error::Upload(_)), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_media_config_defaults_to_notes_folder() {
        let config = MediaConfig::new("demo", "key", "secret");
        assert_eq!(config.folder, "notes");

        let config = config.with_folder("scratch");
        assert_eq!(config.folder, "scratch");
    }
}
