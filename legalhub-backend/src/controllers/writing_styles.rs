use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::middleware::session_auth::require_admin;
use crate::models::WritingStyleInput;
use crate::AppState;

use super::{bad_request, db_failure, non_empty, not_found};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/legal-writing-styles")
            .route(web::get().to(list_styles))
            .route(web::post().to(create_style)),
    );
    cfg.service(
        web::resource("/api/admin/legal-writing-styles/{id}")
            .route(web::get().to(get_style))
            .route(web::put().to(update_style))
            .route(web::delete().to(delete_style)),
    );
}

async fn list_styles(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.list_writing_styles() {
        Ok(styles) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": styles
        })),
        Err(e) => db_failure("Failed to fetch writing styles", e),
    }
}

async fn create_style(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<WritingStyleInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    if non_empty(&body.name).is_none() || non_empty(&body.description).is_none() {
        return bad_request("Name and description are required");
    }

    match state.db.create_writing_style(&body) {
        Ok(style) => {
            log::info!("Created writing style {} ({})", style.id, style.name);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "data": style
            }))
        }
        Err(e) => db_failure("Failed to create writing style", e),
    }
}

async fn get_style(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_writing_style(&path) {
        Ok(Some(style)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": style
        })),
        Ok(None) => not_found("Style not found"),
        Err(e) => db_failure("Failed to fetch writing style", e),
    }
}

async fn update_style(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<WritingStyleInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let blank = |field: &Option<String>| field.is_some() && non_empty(field).is_none();
    if blank(&body.name) || blank(&body.description) {
        return bad_request("Name and description cannot be empty");
    }

    match state.db.update_writing_style(&path, &body) {
        Ok(Some(style)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": style
        })),
        Ok(None) => not_found("Style not found"),
        Err(e) => db_failure("Failed to update writing style", e),
    }
}

async fn delete_style(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.writing_style_usage(&path) {
        Ok(0) => {}
        Ok(count) => {
            return bad_request(&format!(
                "Cannot delete style: it is used in {} prompt(s)",
                count
            ));
        }
        Err(e) => return db_failure("Failed to check writing style usage", e),
    }

    match state.db.delete_writing_style(&path) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Style deleted successfully"
        })),
        Ok(false) => not_found("Style not found"),
        Err(e) => db_failure("Failed to delete writing style", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::models::QaPromptInput;
    use crate::test_support::{admin_token, bearer, init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_style_lifecycle_and_usage_guard() {
        let state = test_state();
        let token = admin_token(&state);
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/legal-writing-styles")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Ngắn gọn" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/admin/legal-writing-styles")
            .insert_header(bearer(&token))
            .set_json(json!({
                "name": "Ngắn gọn",
                "description": "Trả lời trong ba câu",
                "characteristics": ["súc tích"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let created: Value = test::read_body_json(resp).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["is_active"], true);
        let uri = format!("/api/admin/legal-writing-styles/{}", id);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&token))
            .set_json(json!({ "tone": "trung lập", "is_active": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["tone"], "trung lập");
        assert_eq!(body["data"]["name"], "Ngắn gọn");
        assert_eq!(body["data"]["is_active"], false);

        let prompt = state
            .db
            .create_qa_prompt(&QaPromptInput {
                name: Some("P".to_string()),
                system_prompt: Some("S".to_string()),
                writing_style_ids: Some(vec![id.clone()]),
                ..Default::default()
            })
            .unwrap();

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Cannot delete style: it is used in 1 prompt(s)");

        state.db.delete_qa_prompt(&prompt.prompt.id).unwrap();
        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
