use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::middleware::session_auth::require_admin;
use crate::models::{ExampleInput, StyleGuideInput, StyleGuideWithExamples};
use crate::AppState;

use super::{bad_request, db_failure, non_empty, not_found};

const GUIDE_NOT_FOUND: &str = "Style guide not found";
const EXAMPLE_NOT_FOUND: &str = "Example not found";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/style-guides")
            .route("", web::get().to(list_guides))
            .route("", web::post().to(create_guide))
            .route("/{id}", web::get().to(get_guide))
            .route("/{id}", web::patch().to(update_guide))
            .route("/{id}", web::delete().to(delete_guide))
            .route("/{id}/examples", web::post().to(add_example))
            .route("/{id}/examples/{example_id}", web::patch().to(update_example))
            .route("/{id}/examples/{example_id}", web::delete().to(delete_example)),
    );
}

fn load_guide(state: &AppState, id: &str) -> Result<StyleGuideWithExamples, HttpResponse> {
    match state.db.get_style_guide(id) {
        Ok(Some(guide)) => Ok(guide),
        Ok(None) => Err(not_found(GUIDE_NOT_FOUND)),
        Err(e) => Err(db_failure("Failed to fetch style guide", e)),
    }
}

async fn list_guides(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.list_style_guides() {
        Ok(guides) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": guides.len(),
            "data": guides
        })),
        Err(e) => db_failure("Failed to fetch style guides", e),
    }
}

async fn create_guide(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<StyleGuideInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let complete = non_empty(&body.name).is_some()
        && non_empty(&body.description).is_some()
        && body.characteristics.is_some()
        && non_empty(&body.tone).is_some()
        && non_empty(&body.language).is_some();
    if !complete {
        return bad_request("Missing required fields: name, description, characteristics, tone, language");
    }

    match state.db.create_style_guide(&body) {
        Ok(guide) => {
            log::info!(
                "Created style guide {} ({}, {} examples)",
                guide.guide.id,
                guide.guide.name,
                guide.examples.len()
            );
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "data": guide,
                "message": "Style guide created successfully"
            }))
        }
        Err(e) => db_failure("Failed to create style guide", e),
    }
}

async fn get_guide(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match load_guide(&state, &path) {
        Ok(guide) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": guide
        })),
        Err(resp) => resp,
    }
}

async fn update_guide(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<StyleGuideInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.update_style_guide(&path, &body) {
        Ok(Some(guide)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": guide,
            "message": "Style guide updated successfully"
        })),
        Ok(None) => not_found(GUIDE_NOT_FOUND),
        Err(e) => db_failure("Failed to update style guide", e),
    }
}

async fn delete_guide(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let guide = match load_guide(&state, &path) {
        Ok(guide) => guide,
        Err(resp) => return resp,
    };

    if guide.guide.is_default {
        match state.db.count_style_guides() {
            Ok(count) if count > 1 => {
                return bad_request(
                    "Cannot delete the default style guide. Please set another style guide as default first.",
                );
            }
            Ok(_) => {}
            Err(e) => return db_failure("Failed to count style guides", e),
        }
    }

    match state.db.delete_style_guide(&guide.guide.id) {
        Ok(_) => {
            log::info!("Deleted style guide {}", guide.guide.id);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Style guide deleted successfully"
            }))
        }
        Err(e) => db_failure("Failed to delete style guide", e),
    }
}

async fn add_example(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ExampleInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let (Some(before), Some(after)) = (non_empty(&body.before), non_empty(&body.after)) else {
        return bad_request("Before and after text are required");
    };

    let guide = match load_guide(&state, &path) {
        Ok(guide) => guide,
        Err(resp) => return resp,
    };

    match state.db.add_style_guide_example(&guide.guide.id, before, after) {
        Ok(example) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "data": example,
            "message": "Example created successfully"
        })),
        Err(e) => db_failure("Failed to create example", e),
    }
}

async fn update_example(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<ExampleInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let (guide_id, example_id) = path.into_inner();
    let before = non_empty(&body.before);
    let after = non_empty(&body.after);
    if before.is_none() && after.is_none() {
        return bad_request("At least one field (before or after) is required");
    }

    match state.db.get_style_guide_example(&guide_id, &example_id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(EXAMPLE_NOT_FOUND),
        Err(e) => return db_failure("Failed to fetch example", e),
    }

    match state.db.update_style_guide_example(&example_id, before, after) {
        Ok(Some(example)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": example,
            "message": "Example updated successfully"
        })),
        Ok(None) => not_found(EXAMPLE_NOT_FOUND),
        Err(e) => db_failure("Failed to update example", e),
    }
}

async fn delete_example(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let (guide_id, example_id) = path.into_inner();
    match state.db.get_style_guide_example(&guide_id, &example_id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(EXAMPLE_NOT_FOUND),
        Err(e) => return db_failure("Failed to fetch example", e),
    }

    match state.db.delete_style_guide_example(&example_id) {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Example deleted successfully"
        })),
        Err(e) => db_failure("Failed to delete example", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{admin_token, bearer, init_app, test_state};
    use actix_web::test;
    use serde_json::{json, Value};

    fn guide_body(name: &str, is_default: bool) -> Value {
        json!({
            "name": name,
            "description": "Văn phong cho người dân",
            "characteristics": ["Câu ngắn", "Ví dụ cụ thể"],
            "tone": "Thân thiện",
            "language": "vi",
            "isDefault": is_default,
            "examples": [
                { "question": "Căn cứ Điều 3", "answer": "Theo luật" },
                { "before": "  ", "after": "bỏ qua" }
            ]
        })
    }

    #[actix_web::test]
    async fn test_create_list_and_default_rules() {
        let state = test_state();
        let token = admin_token(&state);
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/style-guides")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Thiếu" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Missing required fields: name, description, characteristics, tone, language"
        );

        let req = test::TestRequest::post()
            .uri("/api/admin/style-guides")
            .insert_header(bearer(&token))
            .set_json(guide_body("Mặc định", true))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let first: Value = test::read_body_json(resp).await;
        let first_id = first["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(first["data"]["examples"].as_array().unwrap().len(), 1);
        assert_eq!(first["data"]["examples"][0]["before"], "Căn cứ Điều 3");

        let req = test::TestRequest::post()
            .uri("/api/admin/style-guides")
            .insert_header(bearer(&token))
            .set_json(guide_body("Phụ", false))
            .to_request();
        let second: Value = test::call_and_read_body_json(&app, req).await;
        let second_id = second["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/admin/style-guides")
            .insert_header(bearer(&token))
            .to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total"], 2);
        assert_eq!(list["data"][0]["id"], first_id);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/style-guides/{}", first_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/style-guides/{}", second_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "isDefault": true, "tone": "Nghiêm túc" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["is_default"], true);
        assert_eq!(body["data"]["name"], "Phụ");
        assert_eq!(body["data"]["tone"], "Nghiêm túc");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/style-guides/{}", first_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/style-guides/{}", second_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_examples_belong_to_their_guide() {
        let state = test_state();
        let token = admin_token(&state);
        let app = init_app!(state);

        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let req = test::TestRequest::post()
                .uri("/api/admin/style-guides")
                .insert_header(bearer(&token))
                .set_json(guide_body(name, false))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(body["data"]["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/style-guides/{}/examples", ids[0]))
            .insert_header(bearer(&token))
            .set_json(json!({ "before": "Trước", "after": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/api/admin/style-guides/missing/examples")
            .insert_header(bearer(&token))
            .set_json(json!({ "before": "Trước", "after": "Sau" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/style-guides/{}/examples", ids[0]))
            .insert_header(bearer(&token))
            .set_json(json!({ "before": " Trước ", "after": " Sau " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let example: Value = test::read_body_json(resp).await;
        assert_eq!(example["data"]["before"], "Trước");
        let example_id = example["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/style-guides/{}/examples/{}", ids[1], example_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "after": "Khác" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/admin/style-guides/{}/examples/{}", ids[0], example_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "after": "Sau khi sửa" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["before"], "Trước");
        assert_eq!(body["data"]["after"], "Sau khi sửa");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/admin/style-guides/{}/examples/{}", ids[0], example_id))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }
}
