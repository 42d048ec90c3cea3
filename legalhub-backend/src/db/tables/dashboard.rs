//! Aggregate counts for the admin dashboard

use rusqlite::Result as SqliteResult;
use serde::Serialize;

use super::super::Database;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub documents: i64,
    pub procedures: i64,
    pub prompts: i64,
    pub apps: i64,
    pub active_apps: i64,
    pub results: i64,
    pub qa_prompts: i64,
    pub style_guides: i64,
}

impl Database {
    pub fn dashboard_counts(&self) -> SqliteResult<DashboardCounts> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> SqliteResult<i64> { conn.query_row(sql, [], |row| row.get(0)) };

        Ok(DashboardCounts {
            documents: count("SELECT COUNT(*) FROM legal_documents")?,
            procedures: count("SELECT COUNT(*) FROM procedures")?,
            prompts: count("SELECT COUNT(*) FROM prompts")?,
            apps: count("SELECT COUNT(*) FROM apps")?,
            active_apps: count("SELECT COUNT(*) FROM apps WHERE status = 'active'")?,
            results: count("SELECT COUNT(*) FROM results")?,
            qa_prompts: count("SELECT COUNT(*) FROM qa_prompts")?,
            style_guides: count("SELECT COUNT(*) FROM style_guides")?,
        })
    }
}
