use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WritingStyle;

#[derive(Debug, Clone, Serialize)]
pub struct QaPrompt {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: String,
    pub formatting_instructions: Option<String>,
    pub is_active: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A writing style as linked to a prompt
#[derive(Debug, Clone, Serialize)]
pub struct LinkedWritingStyle {
    pub priority: i64,
    #[serde(flatten)]
    pub style: WritingStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaPromptWithStyles {
    #[serde(flatten)]
    pub prompt: QaPrompt,
    pub writing_styles: Vec<LinkedWritingStyle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaPromptHistory {
    pub id: String,
    pub prompt_id: String,
    pub version: i64,
    pub system_prompt: String,
    pub formatting_instructions: Option<String>,
    pub changed_by: String,
    pub change_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QaPromptInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "prompt_text")]
    pub system_prompt: Option<String>,
    pub formatting_instructions: Option<String>,
    pub is_active: Option<bool>,
    pub writing_style_ids: Option<Vec<String>>,
    pub change_note: Option<String>,
}
