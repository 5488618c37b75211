//! Tests for the media seam as the create handler consumes it: a trait
//! object uploaded to before persistence, with the format gate in front.

use std::sync::Arc;

use quillbox_core::Error;
use quillbox_media::{MediaStorage, MockMediaStorage};

#[tokio::test]
async fn test_upload_through_trait_object_returns_reference_url() {
    let mock = MockMediaStorage::new();
    let media: Arc<dyn MediaStorage> = Arc::new(mock.clone());

    let stored = media
        .upload("receipt.jpg", "image/jpeg", b"JFIF".to_vec())
        .await
        .unwrap();

    // The URL is what gets persisted on the note; the binary never is.
    assert!(stored.url.ends_with("receipt.jpg"));
    assert_eq!(mock.uploads().len(), 1);
}

#[tokio::test]
async fn test_format_gate_runs_before_any_upload() {
    let mock = MockMediaStorage::new();
    let media: Arc<dyn MediaStorage> = Arc::new(mock.clone());

    let err = media
        .upload("notes.txt", "text/plain", b"hello".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(_)));
    assert!(mock.uploads().is_empty());
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_upload_error() {
    let media: Arc<dyn MediaStorage> = Arc::new(MockMediaStorage::failing());

    let err = media
        .upload("receipt.png", "image/png", Vec::new())
        .await
        .unwrap_err();

    // The handler boundary collapses this to the opaque 500.
    assert!(matches!(err, Error::Upload(_)));
}
