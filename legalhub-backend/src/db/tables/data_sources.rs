//! Reference data sources

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{now_rfc3339, timestamp_at};
use super::super::Database;
use crate::models::{DataSource, DataSourceUpdate};

const SOURCE_COLUMNS: &str =
    "id, name, url, priority, is_enabled, description, created_at, updated_at";

impl Database {
    fn row_to_data_source(row: &Row<'_>) -> SqliteResult<DataSource> {
        Ok(DataSource {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            priority: row.get(3)?,
            is_enabled: row.get(4)?,
            description: row.get(5)?,
            created_at: timestamp_at(row, 6)?,
            updated_at: timestamp_at(row, 7)?,
        })
    }

    fn query_data_source(conn: &Connection, id: &str) -> SqliteResult<Option<DataSource>> {
        conn.query_row(
            &format!("SELECT {} FROM data_sources WHERE id = ?1", SOURCE_COLUMNS),
            [id],
            Self::row_to_data_source,
        )
        .optional()
    }

    pub fn list_data_sources(&self) -> SqliteResult<Vec<DataSource>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM data_sources ORDER BY priority",
            SOURCE_COLUMNS
        ))?;
        let sources = stmt
            .query_map([], Self::row_to_data_source)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(sources)
    }

    /// `None` when the id does not exist
    pub fn update_data_source(
        &self,
        id: &str,
        update: &DataSourceUpdate,
    ) -> SqliteResult<Option<DataSource>> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute(
            "UPDATE data_sources SET priority = COALESCE(?1, priority), is_enabled = COALESCE(?2, is_enabled),
             description = COALESCE(?3, description), updated_at = ?4 WHERE id = ?5",
            params![update.priority, update.is_enabled, update.description, now_rfc3339(), id],
        )?;
        if rows_affected == 0 {
            return Ok(None);
        }
        Self::query_data_source(&conn, id)
    }

    #[cfg(test)]
    pub(crate) fn create_data_source(&self, name: &str, url: &str, priority: i64) -> SqliteResult<DataSource> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO data_sources (id, name, url, priority, is_enabled, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, NULL, ?5, ?5)",
            params![id, name, url, priority, now_rfc3339()],
        )?;
        Self::query_data_source(&conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keeps_unset_fields() {
        let db = Database::in_memory().unwrap();
        let second = db.create_data_source("VBPL", "https://vbpl.vn", 2).unwrap();
        db.create_data_source("Công báo", "https://congbao.chinhphu.vn", 1).unwrap();

        let update = DataSourceUpdate {
            is_enabled: Some(false),
            ..Default::default()
        };
        let updated = db.update_data_source(&second.id, &update).unwrap().unwrap();
        assert!(!updated.is_enabled);
        assert_eq!(updated.priority, 2);

        let sources = db.list_data_sources().unwrap();
        assert_eq!(sources[0].name, "Công báo");
        assert!(db.update_data_source("missing", &update).unwrap().is_none());
    }
}
