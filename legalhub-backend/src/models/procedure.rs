use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An administrative procedure with its steps and required documents
#[derive(Debug, Clone, Serialize)]
pub struct Procedure {
    pub id: String,
    pub title: String,
    pub authority: String,
    pub time_est: String,
    pub category: String,
    pub steps: Value,
    pub documents: Value,
    pub fees: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcedureSummary {
    pub id: String,
    pub title: String,
    pub authority: String,
    pub time_est: String,
    pub category: String,
    pub fees: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureInput {
    pub title: Option<String>,
    pub authority: Option<String>,
    pub time_est: Option<String>,
    pub category: Option<String>,
    pub steps: Option<Value>,
    pub documents: Option<Value>,
    pub fees: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProcedure {
    pub title: String,
    pub authority: String,
    pub time_est: String,
    pub category: String,
    pub steps: Value,
    pub documents: Value,
    pub fees: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
}
