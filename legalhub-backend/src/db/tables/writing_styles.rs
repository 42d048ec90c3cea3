//! Legal writing style database operations

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{now_rfc3339, optional_json_at, timestamp_at, to_json};
use super::super::Database;
use crate::models::{WritingStyle, WritingStyleInput};

pub(super) const STYLE_COLUMNS: &str =
    "id, name, description, example_content, tone, characteristics, is_active, created_at, updated_at";

impl Database {
    pub(super) fn row_to_writing_style(row: &Row<'_>, offset: usize) -> SqliteResult<WritingStyle> {
        Ok(WritingStyle {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
            example_content: row.get(offset + 3)?,
            tone: row.get(offset + 4)?,
            characteristics: optional_json_at(row, offset + 5)?,
            is_active: row.get(offset + 6)?,
            created_at: timestamp_at(row, offset + 7)?,
            updated_at: timestamp_at(row, offset + 8)?,
        })
    }

    fn query_writing_style(conn: &Connection, id: &str) -> SqliteResult<Option<WritingStyle>> {
        conn.query_row(
            &format!("SELECT {} FROM legal_writing_styles WHERE id = ?1", STYLE_COLUMNS),
            [id],
            |row| Self::row_to_writing_style(row, 0),
        )
        .optional()
    }

    pub fn list_writing_styles(&self) -> SqliteResult<Vec<WritingStyle>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM legal_writing_styles ORDER BY created_at DESC",
            STYLE_COLUMNS
        ))?;
        let styles = stmt
            .query_map([], |row| Self::row_to_writing_style(row, 0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(styles)
    }

    pub fn get_writing_style(&self, id: &str) -> SqliteResult<Option<WritingStyle>> {
        let conn = self.conn.lock();
        Self::query_writing_style(&conn, id)
    }

    /// `name` and `description` must already be validated
    pub fn create_writing_style(&self, input: &WritingStyleInput) -> SqliteResult<WritingStyle> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO legal_writing_styles (id, name, description, example_content, tone, characteristics, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                input.name.as_deref().unwrap_or_default(),
                input.description.as_deref().unwrap_or_default(),
                input.example_content,
                input.tone,
                input.characteristics.as_ref().map(to_json),
                input.is_active.unwrap_or(true),
                now_rfc3339(),
            ],
        )?;
        Self::query_writing_style(&conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Partial update; `None` when the id does not exist
    pub fn update_writing_style(
        &self,
        id: &str,
        input: &WritingStyleInput,
    ) -> SqliteResult<Option<WritingStyle>> {
        let conn = self.conn.lock();
        let Some(current) = Self::query_writing_style(&conn, id)? else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE legal_writing_styles SET name = ?1, description = ?2, example_content = ?3, tone = ?4,
             characteristics = ?5, is_active = ?6, updated_at = ?7 WHERE id = ?8",
            params![
                input.name.as_ref().unwrap_or(&current.name),
                input.description.as_ref().unwrap_or(&current.description),
                input.example_content.as_ref().or(current.example_content.as_ref()),
                input.tone.as_ref().or(current.tone.as_ref()),
                input
                    .characteristics
                    .as_ref()
                    .or(current.characteristics.as_ref())
                    .map(to_json),
                input.is_active.unwrap_or(current.is_active),
                now_rfc3339(),
                id,
            ],
        )?;
        Self::query_writing_style(&conn, id)
    }

    /// Number of Q&A prompts linking this style
    pub fn writing_style_usage(&self, id: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM qa_prompt_writing_styles WHERE style_id = ?1",
            [id],
            |row| row.get(0),
        )
    }

    pub fn delete_writing_style(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM legal_writing_styles WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}
