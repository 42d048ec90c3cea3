use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub priority: i64,
    pub is_enabled: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSourceUpdate {
    pub priority: Option<i64>,
    pub is_enabled: Option<bool>,
    pub description: Option<String>,
}
