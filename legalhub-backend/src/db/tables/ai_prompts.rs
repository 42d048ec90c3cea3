//! Image prompt gallery database operations

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json, Filter};
use super::super::Database;
use crate::models::{AiImagePrompt, AiImagePromptInput, AiPromptSort};

const AI_PROMPT_COLUMNS: &str = "id, title, description, prompt_template, example_image_url, creator_code, \
     tags, category, is_public, likes_count, views_count, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct AiPromptQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub creator_code: Option<String>,
    pub sort: AiPromptSort,
    pub limit: i64,
    pub offset: i64,
}

/// Blank optional text is stored as NULL
fn optional_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Database {
    fn row_to_ai_prompt(row: &Row<'_>) -> SqliteResult<AiImagePrompt> {
        Ok(AiImagePrompt {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            prompt_template: row.get(3)?,
            example_image_url: row.get(4)?,
            creator_code: row.get(5)?,
            tags: json_at(row, 6)?,
            category: row.get(7)?,
            is_public: row.get(8)?,
            likes_count: row.get(9)?,
            views_count: row.get(10)?,
            created_at: timestamp_at(row, 11)?,
            updated_at: timestamp_at(row, 12)?,
        })
    }

    fn query_ai_prompt(conn: &Connection, id: &str) -> SqliteResult<Option<AiImagePrompt>> {
        conn.query_row(
            &format!("SELECT {} FROM ai_image_prompts WHERE id = ?1", AI_PROMPT_COLUMNS),
            [id],
            Self::row_to_ai_prompt,
        )
        .optional()
    }

    /// Public prompts only, with total match count
    pub fn list_ai_prompts(&self, query: &AiPromptQuery) -> SqliteResult<(Vec<AiImagePrompt>, i64)> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        filter.eq("is_public", true);
        if let Some(term) = &query.search {
            filter.search(term, &["title", "description", "prompt_template"], None);
        }
        if let Some(category) = &query.category {
            filter.eq("category", category.clone());
        }
        if let Some(code) = &query.creator_code {
            filter.eq("creator_code", code.clone());
        }

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM ai_image_prompts{}", filter.sql()),
            filter.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM ai_image_prompts{} ORDER BY {} DESC, rowid DESC LIMIT {} OFFSET {}",
            AI_PROMPT_COLUMNS,
            filter.sql(),
            query.sort.as_ref(),
            query.limit,
            query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let prompts = stmt
            .query_map(filter.params().as_slice(), Self::row_to_ai_prompt)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((prompts, total))
    }

    pub fn get_ai_prompt(&self, id: &str) -> SqliteResult<Option<AiImagePrompt>> {
        let conn = self.conn.lock();
        Self::query_ai_prompt(&conn, id)
    }

    /// Title, template and category must already be validated
    pub fn create_ai_prompt(&self, input: &AiImagePromptInput) -> SqliteResult<AiImagePrompt> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO ai_image_prompts (id, title, description, prompt_template, example_image_url, creator_code,
             tags, category, is_public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
            params![
                id,
                input.title.as_deref().map(str::trim).unwrap_or_default(),
                optional_text(&input.description),
                input.prompt_template.as_deref().unwrap_or_default(),
                optional_text(&input.example_image_url),
                optional_text(&input.creator_code),
                to_json(input.tags.as_deref().unwrap_or_default()),
                input.category.as_deref().map(str::trim).unwrap_or_default(),
                now_rfc3339(),
            ],
        )?;
        Self::query_ai_prompt(&conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Full replacement: a missing creator code or tag list clears it, a missing
    /// description or image keeps the stored one. `None` when the id does not exist.
    pub fn replace_ai_prompt(
        &self,
        id: &str,
        input: &AiImagePromptInput,
    ) -> SqliteResult<Option<AiImagePrompt>> {
        let conn = self.conn.lock();
        let Some(current) = Self::query_ai_prompt(&conn, id)? else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE ai_image_prompts SET title = ?1, description = ?2, prompt_template = ?3, example_image_url = ?4,
             creator_code = ?5, tags = ?6, category = ?7, is_public = ?8, updated_at = ?9 WHERE id = ?10",
            params![
                input.title.as_deref().map(str::trim).unwrap_or(&current.title),
                match &input.description {
                    Some(_) => optional_text(&input.description),
                    None => current.description.as_deref(),
                },
                input.prompt_template.as_deref().unwrap_or(&current.prompt_template),
                match &input.example_image_url {
                    Some(_) => optional_text(&input.example_image_url),
                    None => current.example_image_url.as_deref(),
                },
                optional_text(&input.creator_code),
                to_json(input.tags.as_deref().unwrap_or_default()),
                input.category.as_deref().map(str::trim).unwrap_or(&current.category),
                input.is_public.unwrap_or(true),
                now_rfc3339(),
                id,
            ],
        )?;
        Self::query_ai_prompt(&conn, id)
    }

    pub fn delete_ai_prompt(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM ai_image_prompts WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }

    /// Whether any prompt, public or not, carries this creator code
    pub fn creator_code_in_use(&self, code: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM ai_image_prompts WHERE creator_code = ?1)",
            [code],
            |row| row.get(0),
        )
    }
}
