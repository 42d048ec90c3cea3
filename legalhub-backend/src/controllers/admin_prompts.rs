use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use crate::middleware::session_auth::require_admin;
use crate::models::{Prompt, PromptInput, PromptPatch, PromptVersionAction};
use crate::AppState;

use super::prompts::validate_lengths;
use super::{bad_request, db_failure, non_empty, not_found};

#[derive(Serialize)]
pub struct PromptHeader {
    id: String,
    title: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/prompts/{id}")
            .route(web::get().to(get_prompt))
            .route(web::patch().to(patch_prompt))
            .route(web::delete().to(delete_prompt)),
    );
    cfg.service(
        web::resource("/api/admin/prompts/{id}/versions")
            .route(web::get().to(list_versions))
            .route(web::post().to(version_action)),
    );
}

fn load_prompt(state: &AppState, id: &str) -> Result<Prompt, HttpResponse> {
    match state.db.get_prompt(id) {
        Ok(Some(prompt)) => Ok(prompt),
        Ok(None) => Err(not_found("Prompt not found")),
        Err(e) => Err(db_failure("Failed to fetch prompt", e)),
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

    match load_prompt(&state, &path) {
        Ok(prompt) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt
        })),
        Err(resp) => resp,
    }
}

async fn patch_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<PromptPatch>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let changes = PromptInput {
        title: body.fields.title.as_deref().map(|t| t.trim().to_string()),
        body: body.fields.body.as_deref().map(|b| b.trim().to_string()),
        ..body.fields.clone()
    };
    if let Err(message) = validate_lengths(&changes) {
        return bad_request(message);
    }
    if changes.title.as_deref() == Some("") || changes.body.as_deref() == Some("") {
        return bad_request("Title and body cannot be empty");
    }

    let current = match load_prompt(&state, &path) {
        Ok(prompt) => prompt,
        Err(resp) => return resp,
    };

    if body.save_version {
        match state.db.snapshot_prompt(&current, non_empty(&body.version_note)) {
            Ok(version) => log::info!("Saved prompt {} as version {}", current.id, version.version),
            Err(e) => return db_failure("Failed to save prompt version", e),
        }
    }

    match state.db.update_prompt(&current.id, &changes) {
        Ok(Some(prompt)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": prompt,
            "message": "Prompt updated successfully"
        })),
        Ok(None) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to update prompt", e),
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

    match state.db.delete_prompt(&path) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Prompt deleted successfully"
        })),
        Ok(false) => not_found("Prompt not found"),
        Err(e) => db_failure("Failed to delete prompt", e),
    }
}

async fn list_versions(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let prompt = match load_prompt(&state, &path) {
        Ok(prompt) => prompt,
        Err(resp) => return resp,
    };

    match state.db.list_prompt_versions(&prompt.id) {
        Ok(versions) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": versions,
            "prompt": PromptHeader {
                id: prompt.id,
                title: prompt.title,
            }
        })),
        Err(e) => db_failure("Failed to fetch prompt versions", e),
    }
}

async fn version_action(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<PromptVersionAction>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let prompt = match load_prompt(&state, &path) {
        Ok(prompt) => prompt,
        Err(resp) => return resp,
    };
    let note = non_empty(&body.note);

    if body.action.as_deref() != Some("restore") {
        return match state.db.snapshot_prompt(&prompt, note) {
            Ok(version) => HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": version,
                "message": "Version created successfully"
            })),
            Err(e) => db_failure("Failed to create prompt version", e),
        };
    }

    let Some(version_id) = non_empty(&body.version_id) else {
        return bad_request("version_id is required for restore action");
    };

    let target = match state.db.get_prompt_version(&prompt.id, version_id) {
        Ok(Some(version)) => version,
        Ok(None) => return not_found("Version not found"),
        Err(e) => return db_failure("Failed to fetch prompt version", e),
    };

    match state.db.restore_prompt_version(&target, note) {
        Ok(version) => {
            log::info!("Restored prompt {} to version {}", prompt.id, target.version);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": version,
                "message": format!("Restored to version {}", target.version)
            }))
        }
        Err(e) => db_failure("Failed to restore prompt version", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{admin_token, bearer, init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_patch_with_version_then_restore() {
        let state = test_state();
        let token = admin_token(&state);
        let prompt = state.db.create_prompt("Bản gốc", "Nội dung gốc", "Khác", &[], true).unwrap();
        let app = init_app!(state);
        let base = format!("/api/admin/prompts/{}", prompt.id);

        let req = test::TestRequest::patch()
            .uri(&base)
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "  Bản mới  ", "save_version": true, "version_note": "trước khi sửa" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["title"], "Bản mới");
        assert_eq!(body["data"]["body"], "Nội dung gốc");

        let req = test::TestRequest::get()
            .uri(&format!("{}/versions", base))
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let versions = body["data"].as_array().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0]["title"], "Bản gốc");
        assert_eq!(versions[0]["created_by"], "trước khi sửa");
        assert_eq!(body["prompt"]["title"], "Bản mới");
        let version_id = versions[0]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("{}/versions", base))
            .insert_header(bearer(&token))
            .set_json(json!({ "action": "restore" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri(&format!("{}/versions", base))
            .insert_header(bearer(&token))
            .set_json(json!({ "action": "restore", "version_id": "missing" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post()
            .uri(&format!("{}/versions", base))
            .insert_header(bearer(&token))
            .set_json(json!({ "action": "restore", "version_id": version_id }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Restored to version 1");
        assert_eq!(body["data"]["version"], 2);
        assert_eq!(body["data"]["created_by"], "Restored from version 1");
        assert_eq!(state.db.get_prompt(&prompt.id).unwrap().unwrap().title, "Bản gốc");
    }

    #[actix_web::test]
    async fn test_manual_snapshot_and_missing_prompt() {
        let state = test_state();
        let token = admin_token(&state);
        let prompt = state.db.create_prompt("T", "B", "Khác", &[], false).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/prompts/{}/versions", prompt.id))
            .insert_header(bearer(&token))
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["created_by"], "Version 1");
        assert_eq!(body["data"]["is_public"], false);

        let req = test::TestRequest::patch()
            .uri("/api/admin/prompts/missing")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get()
            .uri(&format!("/api/admin/prompts/{}", prompt.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }
}
