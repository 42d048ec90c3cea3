//! Q&A system prompts, their writing style links and change history

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashSet;

use super::super::sqlite::{now_rfc3339, timestamp_at};
use super::super::Database;
use super::writing_styles::STYLE_COLUMNS;
use crate::models::{LinkedWritingStyle, QaPrompt, QaPromptHistory, QaPromptInput, QaPromptWithStyles};

const PROMPT_COLUMNS: &str = "id, name, description, system_prompt, formatting_instructions, is_active, version, created_at, updated_at";

/// Author recorded on history rows
const CHANGED_BY: &str = "admin";

impl Database {
    fn row_to_qa_prompt(row: &Row<'_>) -> SqliteResult<QaPrompt> {
        Ok(QaPrompt {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            system_prompt: row.get(3)?,
            formatting_instructions: row.get(4)?,
            is_active: row.get(5)?,
            version: row.get(6)?,
            created_at: timestamp_at(row, 7)?,
            updated_at: timestamp_at(row, 8)?,
        })
    }

    fn query_qa_prompt(conn: &Connection, id: &str) -> SqliteResult<Option<QaPrompt>> {
        conn.query_row(
            &format!("SELECT {} FROM qa_prompts WHERE id = ?1", PROMPT_COLUMNS),
            [id],
            Self::row_to_qa_prompt,
        )
        .optional()
    }

    /// Linked styles ordered by priority
    fn query_linked_styles(conn: &Connection, prompt_id: &str) -> SqliteResult<Vec<LinkedWritingStyle>> {
        let columns = STYLE_COLUMNS
            .split(", ")
            .map(|c| format!("s.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT l.priority, {} FROM qa_prompt_writing_styles l
             JOIN legal_writing_styles s ON s.id = l.style_id
             WHERE l.prompt_id = ?1 ORDER BY l.priority",
            columns
        ))?;
        let styles = stmt
            .query_map([prompt_id], |row| {
                Ok(LinkedWritingStyle {
                    priority: row.get(0)?,
                    style: Self::row_to_writing_style(row, 1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(styles)
    }

    fn with_styles(conn: &Connection, prompt: QaPrompt) -> SqliteResult<QaPromptWithStyles> {
        let writing_styles = Self::query_linked_styles(conn, &prompt.id)?;
        Ok(QaPromptWithStyles {
            prompt,
            writing_styles,
        })
    }

    /// Repeated ids keep the priority of their first occurrence
    fn replace_style_links(conn: &Connection, prompt_id: &str, style_ids: &[String]) -> SqliteResult<()> {
        conn.execute(
            "DELETE FROM qa_prompt_writing_styles WHERE prompt_id = ?1",
            [prompt_id],
        )?;
        let mut seen = HashSet::new();
        let unique = style_ids.iter().filter(|id| seen.insert(id.as_str()));
        for (index, style_id) in unique.enumerate() {
            conn.execute(
                "INSERT INTO qa_prompt_writing_styles (prompt_id, style_id, priority) VALUES (?1, ?2, ?3)",
                params![prompt_id, style_id, index as i64 + 1],
            )?;
        }
        Ok(())
    }

    fn insert_history(
        conn: &Connection,
        prompt: &QaPrompt,
        change_note: Option<&str>,
    ) -> SqliteResult<()> {
        conn.execute(
            "INSERT INTO qa_prompt_history (id, prompt_id, version, system_prompt, formatting_instructions, changed_by, change_note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                uuid::Uuid::new_v4().to_string(),
                prompt.id,
                prompt.version,
                prompt.system_prompt,
                prompt.formatting_instructions,
                CHANGED_BY,
                change_note,
                now_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All prompts, newest first, each with its writing styles
    pub fn list_qa_prompts(&self) -> SqliteResult<Vec<QaPromptWithStyles>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM qa_prompts ORDER BY created_at DESC",
            PROMPT_COLUMNS
        ))?;
        let prompts = stmt
            .query_map([], Self::row_to_qa_prompt)?
            .collect::<SqliteResult<Vec<_>>>()?;
        prompts
            .into_iter()
            .map(|prompt| Self::with_styles(&conn, prompt))
            .collect()
    }

    pub fn get_qa_prompt(&self, id: &str) -> SqliteResult<Option<QaPromptWithStyles>> {
        let conn = self.conn.lock();
        Self::query_qa_prompt(&conn, id)?
            .map(|prompt| Self::with_styles(&conn, prompt))
            .transpose()
    }

    /// The active prompt, if any
    pub fn get_active_qa_prompt(&self) -> SqliteResult<Option<QaPromptWithStyles>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {} FROM qa_prompts WHERE is_active = 1 ORDER BY updated_at DESC LIMIT 1",
                PROMPT_COLUMNS
            ),
            [],
            Self::row_to_qa_prompt,
        )
        .optional()?
        .map(|prompt| Self::with_styles(&conn, prompt))
        .transpose()
    }

    /// Create a prompt at version 1; `name` and `system_prompt` must be validated
    pub fn create_qa_prompt(&self, input: &QaPromptInput) -> SqliteResult<QaPromptWithStyles> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let is_active = input.is_active.unwrap_or(false);
        if is_active {
            tx.execute("UPDATE qa_prompts SET is_active = 0 WHERE is_active = 1", [])?;
        }

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO qa_prompts (id, name, description, system_prompt, formatting_instructions, is_active, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
            params![
                id,
                input.name.as_deref().unwrap_or_default(),
                input.description,
                input.system_prompt.as_deref().unwrap_or_default(),
                input.formatting_instructions,
                is_active,
                now_rfc3339(),
            ],
        )?;

        if let Some(style_ids) = &input.writing_style_ids {
            Self::replace_style_links(&tx, &id, style_ids)?;
        }

        let prompt = Self::query_qa_prompt(&tx, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Self::insert_history(&tx, &prompt, Some("Initial version"))?;
        let created = Self::with_styles(&tx, prompt)?;

        tx.commit()?;
        Ok(created)
    }

    /// Apply an update; the version is bumped and history written only when
    /// the system prompt text changes. `None` when the id does not exist.
    pub fn update_qa_prompt(
        &self,
        id: &str,
        input: &QaPromptInput,
    ) -> SqliteResult<Option<QaPromptWithStyles>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(current) = Self::query_qa_prompt(&tx, id)? else {
            return Ok(None);
        };

        let is_active = input.is_active.unwrap_or(current.is_active);
        if is_active && !current.is_active {
            tx.execute("UPDATE qa_prompts SET is_active = 0 WHERE id != ?1", [id])?;
        }

        let system_prompt = input.system_prompt.as_ref().unwrap_or(&current.system_prompt);
        let prompt_changed = *system_prompt != current.system_prompt;
        let version = if prompt_changed {
            current.version + 1
        } else {
            current.version
        };

        tx.execute(
            "UPDATE qa_prompts SET name = ?1, description = ?2, system_prompt = ?3, formatting_instructions = ?4,
             is_active = ?5, version = ?6, updated_at = ?7 WHERE id = ?8",
            params![
                input.name.as_ref().unwrap_or(&current.name),
                input.description.as_ref().or(current.description.as_ref()),
                system_prompt,
                input
                    .formatting_instructions
                    .as_ref()
                    .or(current.formatting_instructions.as_ref()),
                is_active,
                version,
                now_rfc3339(),
                id,
            ],
        )?;

        if let Some(style_ids) = &input.writing_style_ids {
            Self::replace_style_links(&tx, id, style_ids)?;
        }

        let prompt = Self::query_qa_prompt(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        if prompt_changed {
            Self::insert_history(&tx, &prompt, input.change_note.as_deref())?;
        }
        let updated = Self::with_styles(&tx, prompt)?;

        tx.commit()?;
        Ok(Some(updated))
    }

    /// Make one prompt the only active prompt; false when the id does not exist
    pub fn activate_qa_prompt(&self, id: &str) -> SqliteResult<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        if Self::query_qa_prompt(&tx, id)?.is_none() {
            return Ok(false);
        }
        tx.execute("UPDATE qa_prompts SET is_active = 0 WHERE id != ?1", [id])?;
        tx.execute(
            "UPDATE qa_prompts SET is_active = 1, updated_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), id],
        )?;
        tx.commit()?;
        Ok(true)
    }

    pub fn delete_qa_prompt(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM qa_prompts WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// History rows, highest version first
    pub fn list_qa_prompt_history(&self, prompt_id: &str) -> SqliteResult<Vec<QaPromptHistory>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, prompt_id, version, system_prompt, formatting_instructions, changed_by, change_note, created_at
             FROM qa_prompt_history WHERE prompt_id = ?1 ORDER BY version DESC, created_at DESC",
        )?;
        let history = stmt
            .query_map([prompt_id], |row| {
                Ok(QaPromptHistory {
                    id: row.get(0)?,
                    prompt_id: row.get(1)?,
                    version: row.get(2)?,
                    system_prompt: row.get(3)?,
                    formatting_instructions: row.get(4)?,
                    changed_by: row.get(5)?,
                    change_note: row.get(6)?,
                    created_at: timestamp_at(row, 7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(history)
    }
}
