//! Mini-app run results

use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};
use serde_json::Value;

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json};
use super::super::Database;
use crate::models::RunResult;

const RESULT_COLUMNS: &str = "id, app_id, inputs, output_text, output_image_url, created_at";

impl Database {
    fn row_to_result(row: &Row<'_>) -> SqliteResult<RunResult> {
        Ok(RunResult {
            id: row.get(0)?,
            app_id: row.get(1)?,
            inputs: json_at(row, 2)?,
            output_text: row.get(3)?,
            output_image_url: row.get(4)?,
            created_at: timestamp_at(row, 5)?,
        })
    }

    pub fn create_result(&self, app_id: &str, inputs: &Value, output_text: &str) -> SqliteResult<RunResult> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO results (id, app_id, inputs, output_text, output_image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
            params![id, app_id, to_json(inputs), output_text, now_rfc3339()],
        )?;
        conn.query_row(
            &format!("SELECT {} FROM results WHERE id = ?1", RESULT_COLUMNS),
            [&id],
            Self::row_to_result,
        )
    }

    pub fn get_result(&self, id: &str) -> SqliteResult<Option<RunResult>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM results WHERE id = ?1", RESULT_COLUMNS),
            [id],
            Self::row_to_result,
        )
        .optional()
    }

    pub fn count_results_for_app(&self, app_id: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM results WHERE app_id = ?1",
            [app_id],
            |row| row.get(0),
        )
    }
}
