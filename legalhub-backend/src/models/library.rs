//! JSON interchange format for bulk export and import of the legal library

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level export file; either section may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_library_items: Option<Vec<LibraryDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures: Option<Vec<LibraryProcedure>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub issued_by: Option<String>,
    #[serde(default)]
    pub issued_date: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Value>,
    #[serde(default, rename = "source_urls")]
    pub source_urls: Vec<String>,
    #[serde(default, rename = "created_at", skip_deserializing)]
    pub created_at: Option<String>,
    #[serde(default, rename = "updated_at", skip_deserializing)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryProcedure {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub fees: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Option<Value>,
    #[serde(default, rename = "created_at", skip_deserializing)]
    pub created_at: Option<String>,
    #[serde(default, rename = "updated_at", skip_deserializing)]
    pub updated_at: Option<String>,
}

/// Per-section import counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportTally {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResults {
    pub documents: ImportTally,
    pub procedures: ImportTally,
}

impl ImportResults {
    pub fn has_errors(&self) -> bool {
        !self.documents.errors.is_empty() || !self.procedures.errors.is_empty()
    }

    pub fn imported(&self) -> usize {
        self.documents.imported + self.procedures.imported
    }

    /// Comma-joined summary of the non-zero counters
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.documents.imported > 0 {
            parts.push(format!("Imported {} documents", self.documents.imported));
        }
        if self.documents.skipped > 0 {
            parts.push(format!("Skipped {} existing documents", self.documents.skipped));
        }
        if self.procedures.imported > 0 {
            parts.push(format!("Imported {} procedures", self.procedures.imported));
        }
        if self.procedures.skipped > 0 {
            parts.push(format!("Skipped {} existing procedures", self.procedures.skipped));
        }
        parts.join(", ")
    }
}
