//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation and migrations
//! - Row conversion helpers shared by the table modules
//!
//! All table operations are in the tables/ subdirectory.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, Result as SqliteResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Main database wrapper, one connection guarded by a Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        register_functions(&conn)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Open a private in-memory database (used by tests and `DATABASE_URL=:memory:`)
    pub fn in_memory() -> SqliteResult<Self> {
        Self::new(":memory:")
    }

    /// Cheap round trip used by the health check
    pub fn ping(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |_| Ok(()))
    }

    /// Initialize all database tables and run migrations
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Admin accounts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS admin_users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Admin sessions
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT UNIQUE NOT NULL,
                admin_id TEXT NOT NULL REFERENCES admin_users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
            [],
        )?;

        // Legal documents (laws, decrees, circulars ...)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS legal_documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                doc_number TEXT,
                type TEXT NOT NULL,
                authority TEXT NOT NULL,
                issue_date TEXT NOT NULL,
                effective_date TEXT NOT NULL,
                summary TEXT,
                content TEXT NOT NULL DEFAULT '{}',
                tags TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_legal_documents_category ON legal_documents(category)",
            [],
        )?;

        // Administrative procedures
        conn.execute(
            "CREATE TABLE IF NOT EXISTS procedures (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                authority TEXT NOT NULL,
                time_est TEXT NOT NULL,
                category TEXT NOT NULL,
                steps TEXT NOT NULL DEFAULT '[]',
                documents TEXT NOT NULL DEFAULT '[]',
                fees TEXT,
                notes TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Prompt library
        conn.execute(
            "CREATE TABLE IF NOT EXISTS prompts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                is_public INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS prompt_versions (
                id TEXT PRIMARY KEY,
                prompt_id TEXT NOT NULL REFERENCES prompts(id) ON DELETE CASCADE,
                version INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                is_public INTEGER NOT NULL DEFAULT 1,
                created_by TEXT,
                created_at TEXT NOT NULL,
                UNIQUE(prompt_id, version)
            )",
            [],
        )?;

        // Image prompt gallery
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ai_image_prompts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                prompt_template TEXT NOT NULL,
                example_image_url TEXT,
                creator_code TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 1,
                likes_count INTEGER NOT NULL DEFAULT 0,
                views_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_ai_image_prompts_creator ON ai_image_prompts(creator_code)",
            [],
        )?;

        // Mini-apps
        conn.execute(
            "CREATE TABLE IF NOT EXISTS apps (
                id TEXT PRIMARY KEY,
                slug TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'other',
                status TEXT NOT NULL DEFAULT 'draft',
                type TEXT NOT NULL,
                input_schema TEXT NOT NULL,
                prompt_template TEXT NOT NULL,
                output_schema TEXT,
                render_config TEXT,
                share_config TEXT,
                limits TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS results (
                id TEXT PRIMARY KEY,
                app_id TEXT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
                inputs TEXT NOT NULL,
                output_text TEXT NOT NULL,
                output_image_url TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_stats_daily (
                app_id TEXT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                views INTEGER NOT NULL DEFAULT 0,
                submits INTEGER NOT NULL DEFAULT 0,
                shares INTEGER NOT NULL DEFAULT 0,
                affiliate_clicks INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (app_id, date)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_events (
                id TEXT PRIMARY KEY,
                app_id TEXT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
                event_type TEXT NOT NULL,
                result_id TEXT,
                metadata TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_app_events_app ON app_events(app_id, created_at)",
            [],
        )?;

        // Q&A configuration: writing styles, system prompts and their history
        conn.execute(
            "CREATE TABLE IF NOT EXISTS legal_writing_styles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                example_content TEXT,
                tone TEXT,
                characteristics TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS qa_prompts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                system_prompt TEXT NOT NULL,
                formatting_instructions TEXT,
                is_active INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_qa_prompts_active ON qa_prompts(is_active)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS qa_prompt_writing_styles (
                prompt_id TEXT NOT NULL REFERENCES qa_prompts(id) ON DELETE CASCADE,
                style_id TEXT NOT NULL REFERENCES legal_writing_styles(id) ON DELETE CASCADE,
                priority INTEGER NOT NULL DEFAULT 1,
                UNIQUE(prompt_id, style_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS qa_prompt_history (
                id TEXT PRIMARY KEY,
                prompt_id TEXT NOT NULL REFERENCES qa_prompts(id) ON DELETE CASCADE,
                version INTEGER NOT NULL,
                system_prompt TEXT NOT NULL,
                formatting_instructions TEXT,
                changed_by TEXT NOT NULL,
                change_note TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_qa_prompt_history_prompt ON qa_prompt_history(prompt_id, version)",
            [],
        )?;

        // Style guides used to shape Q&A answers
        conn.execute(
            "CREATE TABLE IF NOT EXISTS style_guides (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                characteristics TEXT NOT NULL DEFAULT '[]',
                tone TEXT NOT NULL,
                language TEXT NOT NULL DEFAULT 'vi',
                is_default INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS style_guide_examples (
                id TEXT PRIMARY KEY,
                style_guide_id TEXT NOT NULL REFERENCES style_guides(id) ON DELETE CASCADE,
                "before" TEXT NOT NULL,
                "after" TEXT NOT NULL,
                created_at TEXT NOT NULL
            )"#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_style_guide_examples_guide ON style_guide_examples(style_guide_id)",
            [],
        )?;

        // Reference data sources shown to the admin
        conn.execute(
            "CREATE TABLE IF NOT EXISTS data_sources (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                priority INTEGER NOT NULL,
                is_enabled INTEGER NOT NULL DEFAULT 1,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_data_sources_priority ON data_sources(priority)",
            [],
        )?;

        // Migration: Add generation settings to apps if they don't exist (for old DBs)
        if !has_column(&conn, "apps", "temperature")? {
            conn.execute("ALTER TABLE apps ADD COLUMN temperature REAL", [])?;
        }
        if !has_column(&conn, "apps", "max_tokens")? {
            conn.execute("ALTER TABLE apps ADD COLUMN max_tokens INTEGER", [])?;
        }

        Ok(())
    }
}

/// SQLite's `lower()` and `LIKE` only fold ASCII; `lower_unicode` folds every script
fn register_functions(conn: &Connection) -> SqliteResult<()> {
    conn.create_scalar_function(
        "lower_unicode",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

fn has_column(conn: &Connection, table: &str, column: &str) -> SqliteResult<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get::<_, i64>(0),
    )
    .map(|c| c > 0)
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as stored in every `*_at` column
pub(crate) fn now_rfc3339() -> String {
    format_timestamp(&Utc::now())
}

/// Read an RFC 3339 timestamp column
pub(crate) fn timestamp_at(row: &rusqlite::Row<'_>, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON text column
pub(crate) fn json_at<T: DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> SqliteResult<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable JSON text column
pub(crate) fn optional_json_at<T: DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> SqliteResult<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Serialize a value for a JSON text column
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Accumulates `WHERE` conditions with positional `?` parameters
#[derive(Default)]
pub(crate) struct Filter {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a condition; one parameter per `?` in `condition`
    pub(crate) fn push(&mut self, condition: impl Into<String>, params: Vec<Box<dyn ToSql>>) {
        self.conditions.push(condition.into());
        self.params.extend(params);
    }

    /// Case-insensitive substring match over `columns`, plus an exact tag match when `tag_column` is set
    pub(crate) fn search(&mut self, term: &str, columns: &[&str], tag_column: Option<&str>) {
        let pattern = format!("%{}%", term.to_lowercase());
        let mut parts: Vec<String> = columns
            .iter()
            .map(|c| format!("lower_unicode({}) LIKE ?", c))
            .collect();
        let mut params: Vec<Box<dyn ToSql>> = columns
            .iter()
            .map(|_| Box::new(pattern.clone()) as Box<dyn ToSql>)
            .collect();
        if let Some(tags) = tag_column {
            parts.push(format!(
                "EXISTS (SELECT 1 FROM json_each({}) WHERE json_each.value = ?)",
                tags
            ));
            params.push(Box::new(term.to_string()));
        }
        self.push(format!("({})", parts.join(" OR ")), params);
    }

    /// `column IN (...)`; an empty list adds nothing
    pub(crate) fn any_of(&mut self, column: &str, values: &[String]) {
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        let params = values
            .iter()
            .map(|v| Box::new(v.clone()) as Box<dyn ToSql>)
            .collect();
        self.push(format!("{} IN ({})", column, placeholders), params);
    }

    pub(crate) fn eq(&mut self, column: &str, value: impl ToSql + 'static) {
        self.push(format!("{} = ?", column), vec![Box::new(value)]);
    }

    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
