//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quillbox_core::{
    CreateNoteRequest, Error, Note, NoteRepository, Result, UpdateNoteRequest,
};

const NOTE_COLUMNS: &str = "id, title, content, image, list, tags, created_at_utc, updated_at_utc";

/// Case-insensitive regex match (`~*`) across the five searchable fields.
///
/// The pattern is applied raw, not escaped: regex semantics are the search
/// contract, the empty pattern matches every note, and a pattern Postgres
/// cannot compile surfaces as a database error.
const SEARCH_SQL: &str = "SELECT id, title, content, image, list, tags, created_at_utc, updated_at_utc \
     FROM note \
     WHERE title ~* $1 \
        OR content ~* $1 \
        OR image ~* $1 \
        OR EXISTS (SELECT 1 FROM jsonb_array_elements(list) li WHERE li->>'item' ~* $1) \
        OR EXISTS (SELECT 1 FROM jsonb_array_elements(tags) tg WHERE tg->>'name' ~* $1)";

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to a Note.
///
/// The JSONB array columns are decoded into their record types; a row that
/// fails to decode is a serialization error, not a missing note.
fn map_row_to_note(row: PgRow) -> Result<Note> {
    let list: serde_json::Value = row.get("list");
    let tags: serde_json::Value = row.get("tags");

    Ok(Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image"),
        list: serde_json::from_value(list)?,
        tags: serde_json::from_value(tags)?,
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO note (id, title, content, image, list, tags, created_at_utc, updated_at_utc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.image)
        .bind(serde_json::to_value(&req.list)?)
        .bind(serde_json::to_value(&req.tags)?)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = %id,
            "Note inserted"
        );

        map_row_to_note(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => map_row_to_note(row),
            None => Err(Error::NoteNotFound(id)),
        }
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        // No ORDER BY: rows come back in store order, which is what the
        // listing has always exposed.
        let rows = sqlx::query(&format!("SELECT {} FROM note", NOTE_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn update_fields(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "UPDATE note \
             SET title = $2, content = $3, list = $4, tags = $5, updated_at_utc = $6 \
             WHERE id = $1 \
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(serde_json::to_value(&req.list)?)
        .bind(serde_json::to_value(&req.tags)?)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => map_row_to_note(row),
            None => Err(Error::NoteNotFound(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        tracing::debug!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            "Note deleted"
        );
        Ok(())
    }

    async fn search(&self, pattern: &str) -> Result<Vec<Note>> {
        let start = std::time::Instant::now();

        let rows = sqlx::query(SEARCH_SQL)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        tracing::debug!(
            subsystem = "db",
            component = "notes",
            op = "search",
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search executed"
        );

        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM note WHERE id = $1) AS present")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.get("present"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_sql_covers_all_five_fields() {
        assert!(SEARCH_SQL.contains("title ~* $1"));
        assert!(SEARCH_SQL.contains("content ~* $1"));
        assert!(SEARCH_SQL.contains("image ~* $1"));
        assert!(SEARCH_SQL.contains("li->>'item' ~* $1"));
        assert!(SEARCH_SQL.contains("tg->>'name' ~* $1"));
    }

    #[test]
    fn test_search_sql_uses_case_insensitive_operator() {
        // ~* is the case-insensitive regex operator; ~ alone would not be.
        assert!(!SEARCH_SQL.contains("~ $1"));
        assert_eq!(SEARCH_SQL.matches("~*").count(), 5);
    }

    #[test]
    fn test_note_columns_round_trip_the_full_record() {
        for col in [
            "id",
            "title",
            "content",
            "image",
            "list",
            "tags",
            "created_at_utc",
            "updated_at_utc",
        ] {
            assert!(NOTE_COLUMNS.contains(col), "missing column {}", col);
        }
    }
}
