use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A legal writing style that can be linked to Q&A prompts
#[derive(Debug, Clone, Serialize)]
pub struct WritingStyle {
    pub id: String,
    pub name: String,
    pub description: String,
    pub example_content: Option<String>,
    pub tone: Option<String>,
    pub characteristics: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WritingStyleInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub example_content: Option<String>,
    pub tone: Option<String>,
    pub characteristics: Option<Value>,
    pub is_active: Option<bool>,
}
