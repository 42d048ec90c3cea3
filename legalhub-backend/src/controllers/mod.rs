use actix_web::{error, http::StatusCode, web, HttpResponse};
use serde_json::json;

use crate::ai::AiError;

pub mod admin_apps;
pub mod admin_documents;
pub mod admin_procedures;
pub mod admin_prompts;
pub mod ai_prompts;
pub mod apps;
pub mod auth;
pub mod dashboard;
pub mod data_sources;
pub mod health;
pub mod law;
pub mod legal_library;
pub mod prompts;
pub mod qa;
pub mod qa_prompts;
pub mod style_guides;
pub mod writing_styles;

/// Default page size for public listings
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 100;

/// Register every route plus JSON error bodies for malformed requests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {}", err);
        error::InternalError::from_response(err, error_response(StatusCode::BAD_REQUEST, &message))
            .into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query string: {}", err);
        error::InternalError::from_response(err, error_response(StatusCode::BAD_REQUEST, &message))
            .into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid path: {}", err);
        error::InternalError::from_response(err, error_response(StatusCode::NOT_FOUND, &message))
            .into()
    }));

    health::config(cfg);
    law::config(cfg);
    prompts::config(cfg);
    ai_prompts::config(cfg);
    apps::config(cfg);
    qa::config(cfg);
    auth::config(cfg);
    dashboard::config(cfg);
    admin_documents::config(cfg);
    admin_procedures::config(cfg);
    admin_apps::config(cfg);
    admin_prompts::config(cfg);
    qa_prompts::config(cfg);
    writing_styles::config(cfg);
    style_guides::config(cfg);
    data_sources::config(cfg);
    legal_library::config(cfg);
}

/// `{success: false, error}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "success": false,
        "error": message
    }))
}

pub fn bad_request(message: &str) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: &str) -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, message)
}

/// Log a database failure and hide its details from the client
pub fn db_failure(context: &str, e: rusqlite::Error) -> HttpResponse {
    log::error!("{}: {}", context, e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

/// Map a generation failure to 503 (no keys) or 500
pub fn ai_failure(context: &str, e: &AiError) -> HttpResponse {
    log::error!("{}: {}", context, e);
    match e {
        AiError::NoApiKeys => error_response(StatusCode::SERVICE_UNAVAILABLE, "AI service is not configured"),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("AI generation failed: {}", e)),
    }
}

/// A trimmed, non-empty string field
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// An optional filter value where empty and `all` mean no filter
pub fn filter_value(value: &Option<String>) -> Option<String> {
    non_empty(value)
        .filter(|v| *v != "all")
        .map(str::to_string)
}

/// `limit`/`offset` query values with defaults and bounds applied
pub fn page(limit: &Option<String>, offset: &Option<String>) -> (i64, i64) {
    let limit = non_empty(limit)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v.min(MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT);
    let offset = non_empty(offset)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(0);
    (limit, offset)
}
