//! Administrative procedure database operations

use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json, Filter};
use super::super::Database;
use crate::models::{NewProcedure, Procedure, ProcedureSummary};

const PROCEDURE_COLUMNS: &str = "id, title, authority, time_est, category, steps, documents, fees, notes, tags, status, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ProcedureQuery {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AdminProcedureQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl Database {
    fn row_to_procedure(row: &Row<'_>) -> SqliteResult<Procedure> {
        Ok(Procedure {
            id: row.get(0)?,
            title: row.get(1)?,
            authority: row.get(2)?,
            time_est: row.get(3)?,
            category: row.get(4)?,
            steps: json_at(row, 5)?,
            documents: json_at(row, 6)?,
            fees: row.get(7)?,
            notes: row.get(8)?,
            tags: json_at(row, 9)?,
            status: row.get(10)?,
            created_at: timestamp_at(row, 11)?,
            updated_at: timestamp_at(row, 12)?,
        })
    }

    pub fn search_procedures(
        &self,
        query: &ProcedureQuery,
    ) -> SqliteResult<(Vec<ProcedureSummary>, i64)> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["title", "authority", "notes"], Some("tags"));
        }
        filter.any_of("category", &query.categories);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM procedures{}", filter.sql()),
            filter.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, title, authority, time_est, category, fees, tags
             FROM procedures{} ORDER BY title LIMIT {} OFFSET {}",
            filter.sql(),
            query.limit,
            query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let procedures = stmt
            .query_map(filter.params().as_slice(), |row| {
                Ok(ProcedureSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    authority: row.get(2)?,
                    time_est: row.get(3)?,
                    category: row.get(4)?,
                    fees: row.get(5)?,
                    tags: json_at(row, 6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((procedures, total))
    }

    pub fn list_procedures(&self, query: &AdminProcedureQuery) -> SqliteResult<Vec<Procedure>> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["title"], None);
        }
        if let Some(category) = &query.category {
            filter.eq("category", category.clone());
        }
        if let Some(status) = &query.status {
            filter.eq("status", status.clone());
        }

        let sql = format!(
            "SELECT {} FROM procedures{} ORDER BY created_at DESC",
            PROCEDURE_COLUMNS,
            filter.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let procedures = stmt
            .query_map(filter.params().as_slice(), Self::row_to_procedure)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(procedures)
    }

    pub fn all_procedures(&self) -> SqliteResult<Vec<Procedure>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM procedures ORDER BY created_at DESC, rowid DESC",
            PROCEDURE_COLUMNS
        ))?;
        let procedures = stmt
            .query_map([], Self::row_to_procedure)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(procedures)
    }

    pub fn get_procedure(&self, id: &str) -> SqliteResult<Option<Procedure>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM procedures WHERE id = ?1", PROCEDURE_COLUMNS),
            [id],
            Self::row_to_procedure,
        )
        .optional()
    }

    pub fn procedure_title_exists(&self, title: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM procedures WHERE title = ?1",
            [title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create_procedure(&self, procedure: &NewProcedure) -> SqliteResult<Procedure> {
        let id = uuid::Uuid::new_v4().to_string();
        {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT INTO procedures (id, title, authority, time_est, category, steps, documents, fees, notes, tags, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                params![
                    id,
                    procedure.title,
                    procedure.authority,
                    procedure.time_est,
                    procedure.category,
                    to_json(&procedure.steps),
                    to_json(&procedure.documents),
                    procedure.fees,
                    procedure.notes,
                    to_json(&procedure.tags),
                    procedure.status,
                    now_rfc3339(),
                ],
            )?;
        }
        self.get_procedure(&id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn update_procedure(
        &self,
        id: &str,
        procedure: &NewProcedure,
    ) -> SqliteResult<Option<Procedure>> {
        let rows_affected = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE procedures SET title = ?1, authority = ?2, time_est = ?3, category = ?4, steps = ?5, documents = ?6,
                 fees = ?7, notes = ?8, tags = ?9, status = ?10, updated_at = ?11 WHERE id = ?12",
                params![
                    procedure.title,
                    procedure.authority,
                    procedure.time_est,
                    procedure.category,
                    to_json(&procedure.steps),
                    to_json(&procedure.documents),
                    procedure.fees,
                    procedure.notes,
                    to_json(&procedure.tags),
                    procedure.status,
                    now_rfc3339(),
                    id,
                ],
            )?
        };
        if rows_affected == 0 {
            return Ok(None);
        }
        self.get_procedure(id)
    }

    pub fn delete_procedure(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM procedures WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}
