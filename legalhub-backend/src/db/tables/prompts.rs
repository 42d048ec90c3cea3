//! Prompt library and prompt version database operations

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json, Filter};
use super::super::Database;
use crate::models::{Prompt, PromptInput, PromptVersion};

const PROMPT_COLUMNS: &str = "id, title, body, category, tags, is_public, created_at, updated_at";
const VERSION_COLUMNS: &str =
    "id, prompt_id, version, title, body, category, tags, is_public, created_by, created_at";

#[derive(Debug, Clone, Default)]
pub struct PromptQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl Database {
    fn row_to_prompt(row: &Row<'_>) -> SqliteResult<Prompt> {
        Ok(Prompt {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            category: row.get(3)?,
            tags: json_at(row, 4)?,
            is_public: row.get(5)?,
            created_at: timestamp_at(row, 6)?,
            updated_at: timestamp_at(row, 7)?,
        })
    }

    fn row_to_prompt_version(row: &Row<'_>) -> SqliteResult<PromptVersion> {
        Ok(PromptVersion {
            id: row.get(0)?,
            prompt_id: row.get(1)?,
            version: row.get(2)?,
            title: row.get(3)?,
            body: row.get(4)?,
            category: row.get(5)?,
            tags: json_at(row, 6)?,
            is_public: row.get(7)?,
            created_by: row.get(8)?,
            created_at: timestamp_at(row, 9)?,
        })
    }

    fn query_prompt(conn: &Connection, id: &str) -> SqliteResult<Option<Prompt>> {
        conn.query_row(
            &format!("SELECT {} FROM prompts WHERE id = ?1", PROMPT_COLUMNS),
            [id],
            Self::row_to_prompt,
        )
        .optional()
    }

    /// Newest first, with total match count
    pub fn list_prompts(&self, query: &PromptQuery) -> SqliteResult<(Vec<Prompt>, i64)> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["title", "body"], None);
        }
        if let Some(category) = &query.category {
            filter.eq("category", category.clone());
        }
        if let Some(is_public) = query.is_public {
            filter.eq("is_public", is_public);
        }

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM prompts{}", filter.sql()),
            filter.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM prompts{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            PROMPT_COLUMNS,
            filter.sql(),
            query.limit,
            query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let prompts = stmt
            .query_map(filter.params().as_slice(), Self::row_to_prompt)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((prompts, total))
    }

    pub fn get_prompt(&self, id: &str) -> SqliteResult<Option<Prompt>> {
        let conn = self.conn.lock();
        Self::query_prompt(&conn, id)
    }

    pub fn create_prompt(
        &self,
        title: &str,
        body: &str,
        category: &str,
        tags: &[String],
        is_public: bool,
    ) -> SqliteResult<Prompt> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO prompts (id, title, body, category, tags, is_public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![id, title, body, category, to_json(tags), is_public, now_rfc3339()],
        )?;
        Self::query_prompt(&conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Apply the fields present in `changes`; `None` when the id does not exist
    pub fn update_prompt(&self, id: &str, changes: &PromptInput) -> SqliteResult<Option<Prompt>> {
        let conn = self.conn.lock();
        let Some(current) = Self::query_prompt(&conn, id)? else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE prompts SET title = ?1, body = ?2, category = ?3, tags = ?4, is_public = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                changes.title.as_deref().unwrap_or(&current.title),
                changes.body.as_deref().unwrap_or(&current.body),
                changes.category.as_deref().unwrap_or(&current.category),
                to_json(changes.tags.as_ref().unwrap_or(&current.tags)),
                changes.is_public.unwrap_or(current.is_public),
                now_rfc3339(),
                id,
            ],
        )?;
        Self::query_prompt(&conn, id)
    }

    pub fn delete_prompt(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM prompts WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// Versions of a prompt, highest first
    pub fn list_prompt_versions(&self, prompt_id: &str) -> SqliteResult<Vec<PromptVersion>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM prompt_versions WHERE prompt_id = ?1 ORDER BY version DESC",
            VERSION_COLUMNS
        ))?;
        let versions = stmt
            .query_map([prompt_id], Self::row_to_prompt_version)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(versions)
    }

    pub fn get_prompt_version(
        &self,
        prompt_id: &str,
        version_id: &str,
    ) -> SqliteResult<Option<PromptVersion>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {} FROM prompt_versions WHERE id = ?1 AND prompt_id = ?2",
                VERSION_COLUMNS
            ),
            [version_id, prompt_id],
            Self::row_to_prompt_version,
        )
        .optional()
    }

    /// Store `snapshot` as the next version of its prompt
    pub fn snapshot_prompt(&self, snapshot: &Prompt, note: Option<&str>) -> SqliteResult<PromptVersion> {
        let conn = self.conn.lock();
        let next_version: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM prompt_versions WHERE prompt_id = ?1",
            [&snapshot.id],
            |row| row.get(0),
        )?;
        let created_by = note
            .map(str::to_string)
            .unwrap_or_else(|| format!("Version {}", next_version));

        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO prompt_versions (id, prompt_id, version, title, body, category, tags, is_public, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                snapshot.id,
                next_version,
                snapshot.title,
                snapshot.body,
                snapshot.category,
                to_json(&snapshot.tags),
                snapshot.is_public,
                created_by,
                now_rfc3339(),
            ],
        )?;

        conn.query_row(
            &format!("SELECT {} FROM prompt_versions WHERE id = ?1", VERSION_COLUMNS),
            [&id],
            Self::row_to_prompt_version,
        )
    }

    /// Record the restored state as a new version and copy it onto the prompt
    pub fn restore_prompt_version(
        &self,
        version: &PromptVersion,
        note: Option<&str>,
    ) -> SqliteResult<PromptVersion> {
        let restored = Prompt {
            id: version.prompt_id.clone(),
            title: version.title.clone(),
            body: version.body.clone(),
            category: version.category.clone(),
            tags: version.tags.clone(),
            is_public: version.is_public,
            created_at: version.created_at,
            updated_at: version.created_at,
        };
        let default_note = format!("Restored from version {}", version.version);
        let new_version = self.snapshot_prompt(&restored, Some(note.unwrap_or(&default_note)))?;

        let changes = PromptInput {
            title: Some(restored.title),
            body: Some(restored.body),
            category: Some(restored.category),
            tags: Some(restored.tags),
            is_public: Some(restored.is_public),
        };
        self.update_prompt(&version.prompt_id, &changes)?;
        Ok(new_version)
    }
}
