use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct StyleGuide {
    pub id: String,
    pub name: String,
    pub description: String,
    pub characteristics: Vec<String>,
    pub tone: String,
    pub language: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleGuideExample {
    pub id: String,
    pub style_guide_id: String,
    pub before: String,
    pub after: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleGuideWithExamples {
    #[serde(flatten)]
    pub guide: StyleGuide,
    pub examples: Vec<StyleGuideExample>,
}

/// Public listing row
#[derive(Debug, Clone, Serialize)]
pub struct StyleGuideSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGuideInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub characteristics: Option<Vec<String>>,
    pub tone: Option<String>,
    pub language: Option<String>,
    #[serde(alias = "is_default")]
    pub is_default: Option<bool>,
    pub examples: Option<Vec<ExampleInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExampleInput {
    #[serde(alias = "question")]
    pub before: Option<String>,
    #[serde(alias = "answer")]
    pub after: Option<String>,
}
