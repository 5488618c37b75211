//! Core traits for quillbox abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ListItem, Note, Tag};

/// Request for creating a new note.
///
/// `image` is already resolved to a URL (or empty) by the time the store
/// sees it; the upload happens before persistence.
#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub image: String,
    pub list: Vec<ListItem>,
    pub tags: Vec<Tag>,
}

/// Request for replacing a note's editable fields.
///
/// All four fields are overwritten on every update; fields the caller left
/// out arrive here as their empty defaults. `image` is never part of an
/// update.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: String,
    pub list: Vec<ListItem>,
    pub tags: Vec<Tag>,
}

/// Repository for note CRUD and pattern search.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note atomically and return the persisted record.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by id. Returns `Error::NoteNotFound` when absent.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// List every note, unfiltered and unpaginated, in store order.
    async fn list_all(&self) -> Result<Vec<Note>>;

    /// Replace title, content, list, and tags; returns the updated record.
    /// Returns `Error::NoteNotFound` when no row matches.
    async fn update_fields(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note. Returns `Error::NoteNotFound` when no row matches.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Case-insensitive regex match across title, content, image, every
    /// list item, and every tag name. The empty pattern matches every note.
    async fn search(&self, pattern: &str) -> Result<Vec<Note>>;

    /// Check if a note exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}
