use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::db::PromptQuery;
use crate::models::PromptInput;
use crate::AppState;

use super::{bad_request, db_failure, filter_value, non_empty, not_found, page};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 5000;
const DEFAULT_CATEGORY: &str = "Khác";

#[derive(Deserialize)]
pub struct PromptParams {
    search: Option<String>,
    category: Option<String>,
    public: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/prompts")
            .route(web::get().to(list_prompts))
            .route(web::post().to(create_prompt)),
    );
    cfg.service(
        web::resource("/api/prompts/{id}")
            .route(web::get().to(get_prompt))
            .route(web::put().to(update_prompt))
            .route(web::delete().to(delete_prompt)),
    );
}

/// Length limits shared by the public and admin prompt editors
pub fn validate_lengths(input: &PromptInput) -> Result<(), &'static str> {
    if input
        .title
        .as_deref()
        .is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS)
    {
        return Err("Title must be 200 characters or less");
    }
    if input
        .body
        .as_deref()
        .is_some_and(|b| b.chars().count() > MAX_BODY_CHARS)
    {
        return Err("Prompt body must be 5000 characters or less");
    }
    Ok(())
}

async fn list_prompts(
    state: web::Data<AppState>,
    params: web::Query<PromptParams>,
) -> impl Responder {
    let (limit, offset) = page(&params.limit, &params.offset);
    let query = PromptQuery {
        search: non_empty(&params.search).map(str::to_string),
        category: filter_value(&params.category),
        is_public: non_empty(&params.public).map(|v| v == "true"),
        limit,
        offset,
    };

    match state.db.list_prompts(&query) {
        Ok((prompts, total)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompts": prompts,
            "total": total,
            "limit": limit,
            "offset": offset
        })),
        Err(e) => db_failure("Failed to fetch prompts", e),
    }
}

async fn create_prompt(
    state: web::Data<AppState>,
    body: web::Json<PromptInput>,
) -> impl Responder {
    let (Some(title), Some(prompt_body)) = (non_empty(&body.title), non_empty(&body.body)) else {
        return bad_request("Title and body are required");
    };
    if let Err(message) = validate_lengths(&body) {
        return bad_request(message);
    }

    let category = non_empty(&body.category).unwrap_or(DEFAULT_CATEGORY);
    let tags = body.tags.clone().unwrap_or_default();

    match state
        .db
        .create_prompt(title, prompt_body, category, &tags, body.is_public.unwrap_or(true))
    {
        Ok(prompt) => {
            log::info!("Created prompt {} ({})", prompt.id, prompt.title);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "prompt": prompt
            }))
        }
        Err(e) => db_failure("Failed to create prompt", e),
    }
}

async fn get_prompt(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.get_prompt(&path) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompt": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to fetch prompt", e),
    }
}

async fn update_prompt(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PromptInput>,
) -> impl Responder {
    if let Err(message) = validate_lengths(&body) {
        return bad_request(message);
    }
    if body.is_empty() {
        return bad_request("No fields to update");
    }

    match state.db.update_prompt(&path, &body) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prompt": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to update prompt", e),
    }
}

async fn delete_prompt(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match state.db.delete_prompt(&path) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Prompt deleted successfully"
        })),
        Ok(false) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to delete prompt", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_create_applies_defaults_and_limits() {
        let state = test_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/prompts")
            .set_json(json!({ "title": "Soạn đơn", "body": "Viết đơn khởi kiện" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["prompt"]["category"], "Khác");
        assert_eq!(body["prompt"]["is_public"], true);
        assert_eq!(body["prompt"]["tags"], json!([]));

        let req = test::TestRequest::post()
            .uri("/api/prompts")
            .set_json(json!({ "title": "x", "body": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/prompts")
            .set_json(json!({ "title": "đ".repeat(201), "body": "b" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Title must be 200 characters or less");
    }

    #[actix_web::test]
    async fn test_list_filters_by_visibility() {
        let state = test_state();
        state.db.create_prompt("Công khai", "a", "Khác", &[], true).unwrap();
        state.db.create_prompt("Riêng tư", "b", "Khác", &[], false).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/prompts?public=false").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["prompts"][0]["title"], "Riêng tư");

        let req = test::TestRequest::get().uri("/api/prompts").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 2);
    }

    #[actix_web::test]
    async fn test_update_and_delete() {
        let state = test_state();
        let prompt = state.db.create_prompt("Cũ", "body", "Khác", &[], true).unwrap();
        let app = init_app!(state);
        let uri = format!("/api/prompts/{}", prompt.id);

        let req = test::TestRequest::put().uri(&uri).set_json(json!({})).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "title": "Mới", "isPublic": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["prompt"]["title"], "Mới");
        assert_eq!(body["prompt"]["body"], "body");
        assert_eq!(body["prompt"]["is_public"], false);

        let req = test::TestRequest::put()
            .uri("/api/prompts/missing")
            .set_json(json!({ "title": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
