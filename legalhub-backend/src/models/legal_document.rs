use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A legal document (law, decree, circular ...)
#[derive(Debug, Clone, Serialize)]
pub struct LegalDocument {
    pub id: String,
    pub title: String,
    pub doc_number: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub authority: String,
    pub issue_date: String,
    pub effective_date: String,
    pub summary: Option<String>,
    pub content: Value,
    pub tags: Vec<String>,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List row for the public library (no content body)
#[derive(Debug, Clone, Serialize)]
pub struct LegalDocumentSummary {
    pub id: String,
    pub title: String,
    pub doc_number: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub authority: String,
    pub issue_date: String,
    pub effective_date: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
}

/// Admin create/update body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalDocumentInput {
    pub title: Option<String>,
    pub doc_number: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub authority: Option<String>,
    pub issue_date: Option<String>,
    pub effective_date: Option<String>,
    pub summary: Option<String>,
    pub content: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Validated values written to `legal_documents`
#[derive(Debug, Clone)]
pub struct NewLegalDocument {
    pub title: String,
    pub doc_number: Option<String>,
    pub doc_type: String,
    pub authority: String,
    pub issue_date: String,
    pub effective_date: String,
    pub summary: Option<String>,
    pub content: Value,
    pub tags: Vec<String>,
    pub category: String,
    pub status: String,
}
