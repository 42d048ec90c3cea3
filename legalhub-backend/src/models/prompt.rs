use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a prompt kept in `prompt_versions`
#[derive(Debug, Clone, Serialize)]
pub struct PromptVersion {
    pub id: String,
    pub prompt_id: String,
    pub version: i64,
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public create/update body. `isPublic` and `is_public` are both accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(alias = "isPublic")]
    pub is_public: Option<bool>,
}

impl PromptInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.is_public.is_none()
    }
}

/// Admin PATCH body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptPatch {
    #[serde(flatten)]
    pub fields: PromptInput,
    #[serde(default)]
    pub save_version: bool,
    pub version_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptVersionAction {
    pub action: Option<String>,
    pub version_id: Option<String>,
    pub note: Option<String>,
}
