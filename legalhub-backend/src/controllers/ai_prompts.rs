use actix_web::{web, HttpResponse, Responder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::db::{AiPromptQuery, Database};
use crate::models::{AiImagePromptInput, AiPromptSort};
use crate::AppState;

use super::{bad_request, db_failure, filter_value, non_empty, not_found, page};

pub const MIN_CREATOR_CODE_CHARS: usize = 3;
pub const MAX_CREATOR_CODE_CHARS: usize = 30;
const SUGGESTION_COUNT: usize = 3;

static CREATOR_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("creator code pattern is valid"));

#[derive(Deserialize)]
pub struct GalleryParams {
    search: Option<String>,
    category: Option<String>,
    #[serde(rename = "creatorCode")]
    creator_code: Option<String>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatorCodeParams {
    code: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/ai-prompts")
            .route(web::get().to(list_prompts))
            .route(web::post().to(create_prompt)),
    );
    cfg.service(
        web::resource("/api/ai-prompts/check-creator-code")
            .route(web::get().to(check_creator_code)),
    );
    cfg.service(
        web::resource("/api/ai-prompts/{id}")
            .route(web::get().to(get_prompt))
            .route(web::put().to(update_prompt))
            .route(web::delete().to(delete_prompt)),
    );
}

fn missing_required(input: &AiImagePromptInput) -> bool {
    non_empty(&input.title).is_none()
        || non_empty(&input.prompt_template).is_none()
        || non_empty(&input.category).is_none()
}

/// Why `code` can never be used, if it breaks the format rules
fn creator_code_problem(code: &str) -> Option<&'static str> {
    if !CREATOR_CODE.is_match(code) {
        return Some("Mã chỉ được chứa chữ, số và dấu gạch dưới");
    }
    let len = code.chars().count();
    if !(MIN_CREATOR_CODE_CHARS..=MAX_CREATOR_CODE_CHARS).contains(&len) {
        return Some("Mã phải từ 3-30 ký tự");
    }
    None
}

/// Unused variants of a taken code: `<code>_pro`, then `<code>_1`, `<code>_2`, ...
fn suggest_creator_codes(db: &Database, code: &str) -> rusqlite::Result<Vec<String>> {
    let candidates =
        std::iter::once(format!("{}_pro", code)).chain((1..=100).map(|n| format!("{}_{}", code, n)));
    let mut suggestions = Vec::with_capacity(SUGGESTION_COUNT);
    for candidate in candidates {
        if suggestions.len() == SUGGESTION_COUNT {
            break;
        }
        if !db.creator_code_in_use(&candidate)? {
            suggestions.push(candidate);
        }
    }
    Ok(suggestions)
}

async fn list_prompts(
    state: web::Data<AppState>,
    params: web::Query<GalleryParams>,
) -> impl Responder {
    let (limit, offset) = page(&params.limit, &params.offset);
    let query = AiPromptQuery {
        search: non_empty(&params.search).map(str::to_string),
        category: filter_value(&params.category),
        creator_code: non_empty(&params.creator_code).map(str::to_string),
        sort: non_empty(&params.sort_by)
            .and_then(|s| s.parse::<AiPromptSort>().ok())
            .unwrap_or_default(),
        limit,
        offset,
    };

    match state.db.list_ai_prompts(&query) {
        Ok((prompts, total)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompts": prompts,
            "total": total,
            "limit": limit,
            "offset": offset
        })),
        Err(e) => db_failure("Failed to fetch AI prompts", e),
    }
}

async fn create_prompt(
    state: web::Data<AppState>,
    body: web::Json<AiImagePromptInput>,
) -> impl Responder {
    if missing_required(&body) {
        return bad_request("Missing required fields: title, prompt_template, category");
    }

    match state.db.create_ai_prompt(&body) {
        Ok(prompt) => {
            log::info!(
                "Created AI prompt {} ({}, creator: {})",
                prompt.id,
                prompt.title,
                prompt.creator_code.as_deref().unwrap_or("anonymous")
            );
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "prompt": prompt,
                "message": "Prompt created successfully"
            }))
        }
        Err(e) => db_failure("Failed to create AI prompt", e),
    }
}

async fn check_creator_code(
    state: web::Data<AppState>,
    params: web::Query<CreatorCodeParams>,
) -> impl Responder {
    let Some(code) = non_empty(&params.code) else {
        return bad_request("Creator code is required");
    };

    if let Some(problem) = creator_code_problem(code) {
        return HttpResponse::Ok().json(serde_json::json!({
            "available": false,
            "message": problem,
            "suggestions": []
        }));
    }

    match state.db.creator_code_in_use(code) {
        Ok(false) => HttpResponse::Ok().json(serde_json::json!({
            "available": true,
            "message": "Mã này có thể sử dụng",
            "suggestions": []
        })),
        Ok(true) => match suggest_creator_codes(&state.db, code) {
            Ok(suggestions) => HttpResponse::Ok().json(serde_json::json!({
                "available": false,
                "message": "Mã đã được sử dụng, hãy thử mã khác",
                "suggestions": suggestions
            })),
            Err(e) => db_failure("Failed to suggest creator codes", e),
        },
        Err(e) => db_failure("Failed to check creator code", e),
    }
}

async fn get_prompt(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_ai_prompt(&path) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompt": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to fetch AI prompt", e),
    }
}

async fn update_prompt(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AiImagePromptInput>,
) -> impl Responder {
    if missing_required(&body) {
        return bad_request("Missing required fields: title, prompt_template, category");
    }

    match state.db.replace_ai_prompt(&path, &body) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompt": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to update AI prompt", e),
    }
}

async fn delete_prompt(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.delete_ai_prompt(&path) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Prompt deleted successfully"
        })),
        Ok(false) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to delete AI prompt", e),
    }
}
