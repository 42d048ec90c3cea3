use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Image-generation prompt shared in the public gallery
#[derive(Debug, Clone, Serialize)]
pub struct AiImagePrompt {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub prompt_template: String,
    pub example_image_url: Option<String>,
    pub creator_code: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub is_public: bool,
    pub likes_count: i64,
    pub views_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create and replace body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiImagePromptInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub prompt_template: Option<String>,
    pub example_image_url: Option<String>,
    pub creator_code: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

/// Gallery ordering, always descending; unknown values fall back to newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AiPromptSort {
    #[default]
    CreatedAt,
    LikesCount,
    ViewsCount,
}
