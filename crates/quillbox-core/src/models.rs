//! Data model for quillbox.
//!
//! A [`Note`] is the sole persisted entity: free text plus an optional image
//! reference and two ordered arrays of one-field records. The arrays keep
//! their submitted order; the order carries no meaning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single checklist entry inside a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListItem {
    pub item: String,
}

/// A tag attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub name: String,
}

/// A persisted note.
///
/// `image` is either the empty string or a URL returned by the media
/// collaborator; binary content is never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Note {
    /// Store-assigned identifier (UUIDv7); immutable once created.
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: String,
    pub list: Vec<ListItem>,
    pub tags: Vec<Tag>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl ListItem {
    pub fn new(item: impl Into<String>) -> Self {
        Self { item: item.into() }
    }
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_serializes_to_single_field_record() {
        let item = ListItem::new("buy milk");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({"item": "buy milk"}));
    }

    #[test]
    fn test_tag_serializes_to_single_field_record() {
        let tag = Tag::new("groceries");
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json, serde_json::json!({"name": "groceries"}));
    }

    #[test]
    fn test_note_round_trips_through_json() {
        let note = Note {
            id: Uuid::now_v7(),
            title: "Groceries".to_string(),
            content: "buy milk".to_string(),
            image: String::new(),
            list: vec![ListItem::new("milk"), ListItem::new("eggs")],
            tags: vec![Tag::new("errands")],
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        };

        let json = serde_json::to_string(&note).unwrap();
        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_note_array_order_is_preserved() {
        let raw = serde_json::json!([
            {"item": "first"},
            {"item": "second"},
            {"item": "third"}
        ]);
        let list: Vec<ListItem> = serde_json::from_value(raw).unwrap();
        let items: Vec<&str> = list.iter().map(|l| l.item.as_str()).collect();
        assert_eq!(items, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_note_json_exposes_image_as_plain_string() {
        let note = Note {
            id: Uuid::nil(),
            title: String::new(),
            content: String::new(),
            image: String::new(),
            list: Vec::new(),
            tags: Vec::new(),
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["image"], serde_json::json!(""));
        assert!(json["list"].as_array().unwrap().is_empty());
    }
}
