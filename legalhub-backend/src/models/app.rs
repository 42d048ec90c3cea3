use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status a mini-app must have to be visible and runnable publicly
pub const PUBLISHED_STATUS: &str = "active";

/// A prompt-template mini-app
#[derive(Debug, Clone, Serialize)]
pub struct MiniApp {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    #[serde(rename = "type")]
    pub app_type: String,
    pub input_schema: Value,
    pub prompt_template: String,
    pub output_schema: Option<Value>,
    pub render_config: Option<Value>,
    pub share_config: Option<Value>,
    pub limits: Option<Value>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MiniApp {
    pub fn is_published(&self) -> bool {
        self.status == PUBLISHED_STATUS
    }

    /// Input fields declared in `input_schema.fields`
    pub fn input_fields(&self) -> Vec<InputField> {
        self.input_schema
            .get("fields")
            .and_then(|f| serde_json::from_value(f.clone()).ok())
            .unwrap_or_default()
    }
}

/// One entry of `input_schema.fields`
#[derive(Debug, Clone, Deserialize)]
pub struct InputField {
    #[serde(alias = "id")]
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl InputField {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MiniAppSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    #[serde(rename = "type")]
    pub app_type: String,
    pub created_at: DateTime<Utc>,
}

/// Admin create/update body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppInput {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub app_type: Option<String>,
    pub input_schema: Option<Value>,
    pub prompt_template: Option<String>,
    pub output_schema: Option<Value>,
    pub render_config: Option<Value>,
    pub share_config: Option<Value>,
    pub limits: Option<Value>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewMiniApp {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub app_type: String,
    pub input_schema: Value,
    pub prompt_template: String,
    pub output_schema: Option<Value>,
    pub render_config: Option<Value>,
    pub share_config: Option<Value>,
    pub limits: Option<Value>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

impl From<&MiniApp> for NewMiniApp {
    fn from(app: &MiniApp) -> Self {
        Self {
            slug: app.slug.clone(),
            name: app.name.clone(),
            description: app.description.clone(),
            category: app.category.clone(),
            status: app.status.clone(),
            app_type: app.app_type.clone(),
            input_schema: app.input_schema.clone(),
            prompt_template: app.prompt_template.clone(),
            output_schema: app.output_schema.clone(),
            render_config: app.render_config.clone(),
            share_config: app.share_config.clone(),
            limits: app.limits.clone(),
            temperature: app.temperature,
            max_tokens: app.max_tokens,
        }
    }
}

/// Stored output of a mini-app run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub id: String,
    pub app_id: String,
    pub inputs: Value,
    pub output_text: String,
    pub output_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
