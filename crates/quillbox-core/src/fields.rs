//! Decoding of the `list` and `tags` request fields.
//!
//! Multipart submissions flatten nested structures to text, so these two
//! fields arrive either as already-structured arrays (JSON bodies) or as
//! JSON-encoded strings (form fields). The decode rule is uniform across the
//! pair, not per-field: when either arrives as text, both are decoded as
//! text, and a counterpart that is structured or absent fails the decode.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{ListItem, Tag};

/// An array field as submitted: structured, or JSON text to be decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArrayField<T> {
    Structured(Vec<T>),
    Text(String),
}

impl<T> ArrayField<T> {
    fn is_text(&self) -> bool {
        matches!(self, ArrayField::Text(_))
    }
}

/// Decode the `list`/`tags` pair into concrete vectors.
///
/// Structured mode (neither field is text): structured values pass through,
/// absent fields default to empty. Text mode (either field is text): both
/// fields are parsed from JSON text, and a malformed payload, a structured
/// counterpart, or an absent counterpart is a `Serialization` error that
/// aborts the whole request.
pub fn decode_array_fields(
    list: Option<ArrayField<ListItem>>,
    tags: Option<ArrayField<Tag>>,
) -> Result<(Vec<ListItem>, Vec<Tag>)> {
    let text_mode = list.as_ref().map(ArrayField::is_text).unwrap_or(false)
        || tags.as_ref().map(ArrayField::is_text).unwrap_or(false);

    if !text_mode {
        let list = match list {
            Some(ArrayField::Structured(v)) => v,
            _ => Vec::new(),
        };
        let tags = match tags {
            Some(ArrayField::Structured(v)) => v,
            _ => Vec::new(),
        };
        return Ok((list, tags));
    }

    let list = decode_text_field(list, "list")?;
    let tags = decode_text_field(tags, "tags")?;
    Ok((list, tags))
}

fn decode_text_field<T: DeserializeOwned>(
    field: Option<ArrayField<T>>,
    name: &str,
) -> Result<Vec<T>> {
    match field {
        Some(ArrayField::Text(raw)) => serde_json::from_str(&raw)
            .map_err(|e| Error::Serialization(format!("{} is not valid JSON text: {}", name, e))),
        Some(ArrayField::Structured(_)) => Err(Error::Serialization(format!(
            "{} must be JSON text when its counterpart is",
            name
        ))),
        None => Err(Error::Serialization(format!(
            "{} is missing while its counterpart is JSON text",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text<T>(raw: &str) -> Option<ArrayField<T>> {
        Some(ArrayField::Text(raw.to_string()))
    }

    #[test]
    fn test_both_absent_decodes_to_empty() {
        let (list, tags) = decode_array_fields(None, None).unwrap();
        assert!(list.is_empty());
        assert!(tags.is_empty());
    }

    #[test]
    fn test_both_structured_pass_through() {
        let list = Some(ArrayField::Structured(vec![ListItem::new("milk")]));
        let tags = Some(ArrayField::Structured(vec![Tag::new("errands")]));

        let (list, tags) = decode_array_fields(list, tags).unwrap();
        assert_eq!(list, vec![ListItem::new("milk")]);
        assert_eq!(tags, vec![Tag::new("errands")]);
    }

    #[test]
    fn test_structured_with_absent_counterpart_defaults() {
        let list = Some(ArrayField::Structured(vec![ListItem::new("milk")]));
        let (list, tags) = decode_array_fields(list, None).unwrap();
        assert_eq!(list.len(), 1);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_both_text_are_parsed() {
        let (list, tags) = decode_array_fields(
            text(r#"[{"item":"milk"},{"item":"eggs"}]"#),
            text(r#"[{"name":"errands"}]"#),
        )
        .unwrap();

        assert_eq!(list, vec![ListItem::new("milk"), ListItem::new("eggs")]);
        assert_eq!(tags, vec![Tag::new("errands")]);
    }

    #[test]
    fn test_text_list_with_structured_tags_is_rejected() {
        // One decode rule for the pair: a structured counterpart in text
        // mode is malformed, same as the original behavior.
        let list = text(r#"[{"item":"milk"}]"#);
        let tags = Some(ArrayField::Structured(vec![Tag::new("errands")]));

        let err = decode_array_fields(list, tags).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_text_list_with_absent_tags_is_rejected() {
        let err = decode_array_fields(text(r#"[{"item":"milk"}]"#), None).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn test_absent_list_with_text_tags_is_rejected() {
        let err = decode_array_fields(None, text(r#"[{"name":"errands"}]"#)).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn test_malformed_text_aborts_both() {
        let err =
            decode_array_fields(text("not json"), text(r#"[{"name":"errands"}]"#)).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_text_with_wrong_record_shape_is_rejected() {
        // Valid JSON but not an array of {"item": ...} records.
        let err = decode_array_fields(
            text(r#"{"item":"milk"}"#),
            text(r#"[{"name":"errands"}]"#),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_array_field_deserializes_untagged() {
        let structured: ArrayField<Tag> =
            serde_json::from_value(serde_json::json!([{"name": "a"}])).unwrap();
        assert!(matches!(structured, ArrayField::Structured(_)));

        let as_text: ArrayField<Tag> =
            serde_json::from_value(serde_json::json!(r#"[{"name":"a"}]"#)).unwrap();
        assert!(matches!(as_text, ArrayField::Text(_)));
    }
}
