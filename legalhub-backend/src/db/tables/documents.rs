//! Legal document database operations

use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{json_at, now_rfc3339, timestamp_at, to_json, Filter};
use super::super::Database;
use crate::models::{LegalDocument, LegalDocumentSummary, NewLegalDocument};

const DOCUMENT_COLUMNS: &str = "id, title, doc_number, type, authority, issue_date, effective_date, summary, content, tags, category, status, created_at, updated_at";

/// Query for the public document library
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Query for the admin document list
#[derive(Debug, Clone, Default)]
pub struct AdminDocumentQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub doc_type: Option<String>,
    pub status: Option<String>,
}

impl Database {
    fn row_to_document(row: &Row<'_>) -> SqliteResult<LegalDocument> {
        Ok(LegalDocument {
            id: row.get(0)?,
            title: row.get(1)?,
            doc_number: row.get(2)?,
            doc_type: row.get(3)?,
            authority: row.get(4)?,
            issue_date: row.get(5)?,
            effective_date: row.get(6)?,
            summary: row.get(7)?,
            content: json_at(row, 8)?,
            tags: json_at(row, 9)?,
            category: row.get(10)?,
            status: row.get(11)?,
            created_at: timestamp_at(row, 12)?,
            updated_at: timestamp_at(row, 13)?,
        })
    }

    /// Search the public library; returns the page and the total match count
    pub fn search_documents(
        &self,
        query: &DocumentQuery,
    ) -> SqliteResult<(Vec<LegalDocumentSummary>, i64)> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["title", "doc_number", "summary"], Some("tags"));
        }
        filter.any_of("category", &query.categories);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM legal_documents{}", filter.sql()),
            filter.params().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT id, title, doc_number, type, authority, issue_date, effective_date, summary, tags, category
             FROM legal_documents{} ORDER BY issue_date DESC LIMIT {} OFFSET {}",
            filter.sql(),
            query.limit,
            query.offset
        );
        let mut stmt = conn.prepare(&sql)?;
        let documents = stmt
            .query_map(filter.params().as_slice(), |row| {
                Ok(LegalDocumentSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    doc_number: row.get(2)?,
                    doc_type: row.get(3)?,
                    authority: row.get(4)?,
                    issue_date: row.get(5)?,
                    effective_date: row.get(6)?,
                    summary: row.get(7)?,
                    tags: json_at(row, 8)?,
                    category: row.get(9)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok((documents, total))
    }

    /// Admin list, newest first
    pub fn list_documents(&self, query: &AdminDocumentQuery) -> SqliteResult<Vec<LegalDocument>> {
        let conn = self.conn.lock();

        let mut filter = Filter::new();
        if let Some(term) = &query.search {
            filter.search(term, &["title", "doc_number"], None);
        }
        if let Some(category) = &query.category {
            filter.eq("category", category.clone());
        }
        if let Some(doc_type) = &query.doc_type {
            filter.eq("type", doc_type.clone());
        }
        if let Some(status) = &query.status {
            filter.eq("status", status.clone());
        }

        let sql = format!(
            "SELECT {} FROM legal_documents{} ORDER BY created_at DESC",
            DOCUMENT_COLUMNS,
            filter.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let documents = stmt
            .query_map(filter.params().as_slice(), Self::row_to_document)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(documents)
    }

    /// Every document, newest first (export)
    pub fn all_documents(&self) -> SqliteResult<Vec<LegalDocument>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM legal_documents ORDER BY created_at DESC, rowid DESC",
            DOCUMENT_COLUMNS
        ))?;
        let documents = stmt
            .query_map([], Self::row_to_document)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(documents)
    }

    pub fn get_document(&self, id: &str) -> SqliteResult<Option<LegalDocument>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM legal_documents WHERE id = ?1", DOCUMENT_COLUMNS),
            [id],
            Self::row_to_document,
        )
        .optional()
    }

    pub fn document_title_exists(&self, title: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM legal_documents WHERE title = ?1",
            [title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create_document(&self, doc: &NewLegalDocument) -> SqliteResult<LegalDocument> {
        let id = uuid::Uuid::new_v4().to_string();
        {
            let conn = self.conn.lock();
            let now = now_rfc3339();
            conn.execute(
                "INSERT INTO legal_documents (id, title, doc_number, type, authority, issue_date, effective_date, summary, content, tags, category, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
                    id,
                    doc.title,
                    doc.doc_number,
                    doc.doc_type,
                    doc.authority,
                    doc.issue_date,
                    doc.effective_date,
                    doc.summary,
                    to_json(&doc.content),
                    to_json(&doc.tags),
                    doc.category,
                    doc.status,
                    now,
                ],
            )?;
        }
        self.get_document(&id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Replace all editable fields; `None` when the id does not exist
    pub fn update_document(
        &self,
        id: &str,
        doc: &NewLegalDocument,
    ) -> SqliteResult<Option<LegalDocument>> {
        let rows_affected = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE legal_documents SET title = ?1, doc_number = ?2, type = ?3, authority = ?4, issue_date = ?5,
                 effective_date = ?6, summary = ?7, content = ?8, tags = ?9, category = ?10, status = ?11, updated_at = ?12
                 WHERE id = ?13",
                params![
                    doc.title,
                    doc.doc_number,
                    doc.doc_type,
                    doc.authority,
                    doc.issue_date,
                    doc.effective_date,
                    doc.summary,
                    to_json(&doc.content),
                    to_json(&doc.tags),
                    doc.category,
                    doc.status,
                    now_rfc3339(),
                    id,
                ],
            )?
        };
        if rows_affected == 0 {
            return Ok(None);
        }
        self.get_document(id)
    }

    pub fn delete_document(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM legal_documents WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}
