//! Mini-app database operations

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, optional_json_at, timestamp_at, to_json, Filter};
use super::super::Database;
use crate::models::{MiniApp, MiniAppSummary, NewMiniApp};

const APP_COLUMNS: &str = "id, slug, name, description, category, status, type, input_schema, prompt_template, output_schema, render_config, share_config, limits, temperature, max_tokens, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct AppQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Database {
    fn row_to_app(row: &Row<'_>) -> SqliteResult<MiniApp> {
        Ok(MiniApp {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            status: row.get(5)?,
            app_type: row.get(6)?,
            input_schema: json_at(row, 7)?,
            prompt_template: row.get(8)?,
            output_schema: optional_json_at(row, 9)?,
            render_config: optional_json_at(row, 10)?,
            share_config: optional_json_at(row, 11)?,
            limits: optional_json_at(row, 12)?,
            temperature: row.get(13)?,
            max_tokens: row.get(14)?,
            created_at: timestamp_at(row, 15)?,
            updated_at: timestamp_at(row, 16)?,
        })
    }

    fn query_app(conn: &Connection, column: &str, value: &str) -> SqliteResult<Option<MiniApp>> {
        conn.query_row(
            &format!("SELECT {} FROM apps WHERE {} = ?1", APP_COLUMNS, column),
            [value],
            Self::row_to_app,
        )
        .optional()
    }

    /// Public catalog, ordered by name
    pub fn list_app_summaries(&self, query: &AppQuery) -> SqliteResult<(Vec<MiniAppSummary>, i64)> {
        let conn = self.conn.lock();
        let filter = Self::app_filter(query);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM apps{}", filter.sql()),
            filter.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, slug, name, description, category, status, type, created_at
             FROM apps{} ORDER BY name LIMIT {} OFFSET {}",
            filter.sql(),
            query.limit.unwrap_or(-1),
            query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let apps = stmt
            .query_map(filter.params().as_slice(), |row| {
                Ok(MiniAppSummary {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    category: row.get(4)?,
                    status: row.get(5)?,
                    app_type: row.get(6)?,
                    created_at: timestamp_at(row, 7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((apps, total))
    }

    /// Admin list, newest first
    pub fn list_apps(&self, query: &AppQuery) -> SqliteResult<Vec<MiniApp>> {
        let conn = self.conn.lock();
        let filter = Self::app_filter(query);

        let sql = format!(
            "SELECT {} FROM apps{} ORDER BY created_at DESC",
            APP_COLUMNS,
            filter.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let apps = stmt
            .query_map(filter.params().as_slice(), Self::row_to_app)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(apps)
    }

    fn app_filter(query: &AppQuery) -> Filter {
        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["name", "slug"], None);
        }
        if let Some(category) = &query.category {
            filter.eq("category", category.clone());
        }
        if let Some(status) = &query.status {
            filter.eq("status", status.clone());
        }
        filter
    }

    pub fn get_app(&self, id: &str) -> SqliteResult<Option<MiniApp>> {
        let conn = self.conn.lock();
        Self::query_app(&conn, "id", id)
    }

    pub fn get_app_by_slug(&self, slug: &str) -> SqliteResult<Option<MiniApp>> {
        let conn = self.conn.lock();
        Self::query_app(&conn, "slug", slug)
    }

    /// Whether `slug` is taken by an app other than `except_id`
    pub fn slug_taken(&self, slug: &str, except_id: Option<&str>) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM apps WHERE slug = ?1 AND id != COALESCE(?2, '')",
            params![slug, except_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create_app(&self, app: &NewMiniApp) -> SqliteResult<MiniApp> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO apps (id, slug, name, description, category, status, type, input_schema, prompt_template,
             output_schema, render_config, share_config, limits, temperature, max_tokens, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                id,
                app.slug,
                app.name,
                app.description,
                app.category,
                app.status,
                app.app_type,
                to_json(&app.input_schema),
                app.prompt_template,
                app.output_schema.as_ref().map(to_json),
                app.render_config.as_ref().map(to_json),
                app.share_config.as_ref().map(to_json),
                app.limits.as_ref().map(to_json),
                app.temperature,
                app.max_tokens,
                now_rfc3339(),
            ],
        )?;
        Self::query_app(&conn, "id", &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn update_app(&self, id: &str, app: &NewMiniApp) -> SqliteResult<Option<MiniApp>> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "UPDATE apps SET slug = ?1, name = ?2, description = ?3, category = ?4, status = ?5, type = ?6,
             input_schema = ?7, prompt_template = ?8, output_schema = ?9, render_config = ?10, share_config = ?11,
             limits = ?12, temperature = ?13, max_tokens = ?14, updated_at = ?15 WHERE id = ?16",
            params![
                app.slug,
                app.name,
                app.description,
                app.category,
                app.status,
                app.app_type,
                to_json(&app.input_schema),
                app.prompt_template,
                app.output_schema.as_ref().map(to_json),
                app.render_config.as_ref().map(to_json),
                app.share_config.as_ref().map(to_json),
                app.limits.as_ref().map(to_json),
                app.temperature,
                app.max_tokens,
                now_rfc3339(),
                id,
            ],
        )?;
        if rows_affected == 0 {
            return Ok(None);
        }
        Self::query_app(&conn, "id", id)
    }

    pub fn delete_app(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM apps WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}
