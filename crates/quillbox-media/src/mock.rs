//! Mock media backend for deterministic testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quillbox_core::{Error, Result};

use crate::{validate_format, MediaStorage, StoredMedia};

/// One upload seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Mock media backend.
///
/// Records every upload for assertions and returns a deterministic URL.
/// Format validation runs exactly as in the real backend.
#[derive(Clone, Default)]
pub struct MockMediaStorage {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    fail: bool,
}

impl MockMediaStorage {
    /// Create a mock that accepts uploads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// All uploads recorded so far.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStorage for MockMediaStorage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredMedia> {
        validate_format(filename)?;

        if self.fail {
            return Err(Error::Upload("mock upload failure".to_string()));
        }

        self.uploads.lock().unwrap().push(RecordedUpload {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            size_bytes: data.len(),
        });

        Ok(StoredMedia {
            url: format!("https://media.mock/notes/{}", filename),
            public_id: format!("notes/{}", filename),
        })
    }
}
