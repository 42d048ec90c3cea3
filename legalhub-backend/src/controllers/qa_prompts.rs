use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::middleware::session_auth::require_admin;
use crate::models::QaPromptInput;
use crate::AppState;

use super::{bad_request, db_failure, non_empty, not_found};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/qa-prompts")
            .route(web::get().to(list_prompts))
            .route(web::post().to(create_prompt)),
    );
    cfg.service(web::resource("/api/admin/qa-prompts/active").route(web::get().to(get_active)));
    cfg.service(
        web::resource("/api/admin/qa-prompts/{id}")
            .route(web::get().to(get_prompt))
            .route(web::put().to(update_prompt))
            .route(web::delete().to(delete_prompt)),
    );
    cfg.service(
        web::resource("/api/admin/qa-prompts/{id}/history").route(web::get().to(get_history)),
    );
    cfg.service(
        web::resource("/api/admin/qa-prompts/{id}/activate").route(web::post().to(activate_prompt)),
    );
}

/// Reject links to writing styles that do not exist
fn check_style_ids(state: &AppState, input: &QaPromptInput) -> Result<(), HttpResponse> {
    for id in input.writing_style_ids.iter().flatten() {
        match state.db.get_writing_style(id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(bad_request(&format!("Writing style not found: {}", id))),
            Err(e) => return Err(db_failure("Failed to check writing style", e)),
        }
    }
    Ok(())
}

async fn list_prompts(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.list_qa_prompts() {
        Ok(prompts) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompts
        })),
        Err(e) => db_failure("Failed to fetch Q&A prompts", e),
    }
}

async fn create_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<QaPromptInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    if non_empty(&body.name).is_none() || non_empty(&body.system_prompt).is_none() {
        return bad_request("Name and system_prompt are required");
    }
    if let Err(resp) = check_style_ids(&state, &body) {
        return resp;
    }

    match state.db.create_qa_prompt(&body) {
        Ok(prompt) => {
            log::info!(
                "Created Q&A prompt {} ({}, active: {})",
                prompt.prompt.id,
                prompt.prompt.name,
                prompt.prompt.is_active
            );
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "data": prompt
            }))
        }
        Err(e) => db_failure("Failed to create Q&A prompt", e),
    }
}

async fn get_active(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_active_qa_prompt() {
        Ok(prompt) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt
        })),
        Err(e) => db_failure("Failed to fetch active Q&A prompt", e),
    }
}

async fn get_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_qa_prompt(&path) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to fetch Q&A prompt", e),
    }
}

async fn update_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<QaPromptInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    if body.name.is_some() && non_empty(&body.name).is_none() {
        return bad_request("Name cannot be empty");
    }
    if body.system_prompt.is_some() && non_empty(&body.system_prompt).is_none() {
        return bad_request("system_prompt cannot be empty");
    }
    if let Err(resp) = check_style_ids(&state, &body) {
        return resp;
    }

    match state.db.update_qa_prompt(&path, &body) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to update Q&A prompt", e),
    }
}

async fn delete_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_qa_prompt(&path) {
        Ok(Some(prompt)) if prompt.prompt.is_active => {
            return bad_request("Cannot delete active prompt");
        }
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Prompt not found"),
        Err(e) => return db_failure("Failed to fetch Q&A prompt", e),
    }

    match state.db.delete_qa_prompt(&path) {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Prompt deleted successfully"
        })),
        Err(e) => db_failure("Failed to delete Q&A prompt", e),
    }
}

async fn get_history(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.list_qa_prompt_history(&path) {
        Ok(history) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": history
        })),
        Err(e) => db_failure("Failed to fetch Q&A prompt history", e),
    }
}

async fn activate_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.activate_qa_prompt(&path) {
        Ok(true) => {}
        Ok(false) => return not_found("Prompt not found"),
        Err(e) => return db_failure("Failed to activate Q&A prompt", e),
    }

    log::info!("Activated Q&A prompt {}", path);
    match state.db.get_qa_prompt(&path) {
        Ok(prompt) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt
        })),
        Err(e) => db_failure("Failed to fetch Q&A prompt", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::models::WritingStyleInput;
    use crate::test_support::{admin_token, bearer, init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_create_links_styles_and_keeps_one_active() {
        let state = test_state();
        let token = admin_token(&state);
        let style_a = state
            .db
            .create_writing_style(&WritingStyleInput {
                name: Some("Trang trọng".to_string()),
                description: Some("Dùng thuật ngữ chuẩn".to_string()),
                ..Default::default()
            })
            .unwrap();
        let style_b = state
            .db
            .create_writing_style(&WritingStyleInput {
                name: Some("Gần gũi".to_string()),
                description: Some("Giải thích đơn giản".to_string()),
                ..Default::default()
            })
            .unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Thiếu nội dung" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "name": "Thứ nhất",
                "prompt_text": "Bạn là trợ lý.",
                "is_active": true,
                "writing_style_ids": [style_b.id, style_a.id]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let first: Value = test::read_body_json(resp).await;
        let first_id = first["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(first["data"]["system_prompt"], "Bạn là trợ lý.");
        assert_eq!(first["data"]["writing_styles"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "X", "system_prompt": "Y", "writing_style_ids": ["missing"] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Thứ hai", "system_prompt": "Bạn là luật sư.", "is_active": true }))
            .to_request();
        let second: Value = test::call_and_read_body_json(&app, req).await;
        let second_id = second["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/admin/qa-prompts/active")
            .insert_header(bearer(&token))
            .to_request();
        let active: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(active["data"]["id"], second_id);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/qa-prompts/{}", second_id))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Cannot delete active prompt");

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/qa-prompts/{}/activate", first_id))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["is_active"], true);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/qa-prompts/{}", second_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts/missing/activate")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_repeated_style_ids_link_once() {
        let state = test_state();
        let token = admin_token(&state);
        let style_a = state
            .db
            .create_writing_style(&WritingStyleInput {
                name: Some("Trang trọng".to_string()),
                description: Some("Dùng thuật ngữ chuẩn".to_string()),
                ..Default::default()
            })
            .unwrap();
        let style_b = state
            .db
            .create_writing_style(&WritingStyleInput {
                name: Some("Gần gũi".to_string()),
                description: Some("Giải thích đơn giản".to_string()),
                ..Default::default()
            })
            .unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({
                "name": "Lặp",
                "system_prompt": "Bạn là trợ lý.",
                "writing_style_ids": [style_a.id, style_a.id, style_b.id]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let created: Value = test::read_body_json(resp).await;
        let styles = created["data"]["writing_styles"].as_array().unwrap();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0]["id"], style_a.id);
        assert_eq!(styles[0]["priority"], 1);
        assert_eq!(styles[1]["id"], style_b.id);
        assert_eq!(styles[1]["priority"], 2);

        let req = test::TestRequest::put()
            .uri(&format!("/api/admin/qa-prompts/{}", created["data"]["id"].as_str().unwrap()))
            .insert_header(bearer(&token))
            .set_json(json!({ "writing_style_ids": [style_b.id, style_b.id] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let updated: Value = test::read_body_json(resp).await;
        assert_eq!(updated["data"]["writing_styles"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_update_versions_only_on_prompt_change() {
        let state = test_state();
        let token = admin_token(&state);
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/qa-prompts")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "P", "system_prompt": "v1" }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/admin/qa-prompts/{}", created["data"]["id"].as_str().unwrap());

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "description": "mô tả" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["version"], 1);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "system_prompt": "v2", "change_note": "sửa lời nhắc" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["version"], 2);
        assert_eq!(body["data"]["description"], "mô tả");

        let req = test::TestRequest::get()
            .uri(&format!("{}/history", uri))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["version"], 2);
        assert_eq!(history[0]["change_note"], "sửa lời nhắc");
        assert_eq!(history[1]["change_note"], "Initial version");

        let req = test::TestRequest::put()
            .uri("/api/admin/qa-prompts/missing")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
