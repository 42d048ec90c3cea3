use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::session_auth::require_admin;
use crate::models::{
    ImportResults, ImportTally, LegalDocument, LibraryBundle, LibraryDocument, LibraryProcedure,
    NewLegalDocument, NewProcedure, Procedure,
};
use crate::AppState;

use super::{bad_request, db_failure, error_response, non_empty};

/// Procedures have no level column; exports report the lowest tier
const DEFAULT_LEVEL: &str = "commune";

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("slug pattern is valid"));

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/legal-library/export").route(web::get().to(export_library)),
    );
    cfg.service(
        web::resource("/api/admin/legal-library/import").route(web::post().to(import_library)),
    );
}

/// Lowercase, dash-separated, ASCII word characters only
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = WHITESPACE.replace_all(&lowered, "-");
    NON_SLUG.replace_all(&dashed, "").into_owned()
}

fn export_document(doc: LegalDocument) -> LibraryDocument {
    let (content, chapters, source_urls) = match &doc.content {
        Value::Object(map) => (
            map.get("raw").and_then(Value::as_str).unwrap_or_default().to_string(),
            map.get("chapters")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            map.get("source_urls")
                .and_then(Value::as_array)
                .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
        ),
        Value::String(raw) => (raw.clone(), Vec::new(), Vec::new()),
        Value::Null => (String::new(), Vec::new(), Vec::new()),
        other => (other.to_string(), Vec::new(), Vec::new()),
    };

    LibraryDocument {
        slug: Some(slugify(&doc.title)),
        id: Some(doc.id),
        title: Some(doc.title),
        doc_type: Some(doc.doc_type),
        document_number: doc.doc_number,
        issued_by: Some(doc.authority),
        issued_date: Some(doc.issue_date),
        effective_date: Some(doc.effective_date),
        category: Some(doc.category),
        tags: doc.tags,
        summary: doc.summary,
        content: Some(content),
        chapters,
        source_urls,
        created_at: Some(doc.created_at.to_rfc3339()),
        updated_at: Some(doc.updated_at.to_rfc3339()),
    }
}

fn export_procedure(procedure: Procedure) -> LibraryProcedure {
    LibraryProcedure {
        slug: Some(slugify(&procedure.title)),
        id: Some(procedure.id),
        title: Some(procedure.title),
        category: Some(procedure.category),
        authority: Some(procedure.authority),
        level: Some(DEFAULT_LEVEL.to_string()),
        description: procedure.notes,
        estimated_time: Some(procedure.time_est),
        fees: procedure.fees,
        tags: procedure.tags,
        steps: Some(procedure.steps),
        created_at: Some(procedure.created_at.to_rfc3339()),
        updated_at: Some(procedure.updated_at.to_rfc3339()),
    }
}

async fn export_library(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ExportParams>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let (with_documents, with_procedures) = match non_empty(&query.kind) {
        None | Some("all") => (true, true),
        Some("documents") => (true, false),
        Some("procedures") => (false, true),
        Some(_) => return bad_request("Invalid export type"),
    };

    let mut bundle = LibraryBundle::default();
    if with_documents {
        match state.db.all_documents() {
            Ok(docs) => bundle.legal_library_items = Some(docs.into_iter().map(export_document).collect()),
            Err(e) => return db_failure("Failed to fetch documents", e),
        }
    }
    if with_procedures {
        match state.db.all_procedures() {
            Ok(procs) => bundle.procedures = Some(procs.into_iter().map(export_procedure).collect()),
            Err(e) => return db_failure("Failed to fetch procedures", e),
        }
    }

    let body = match serde_json::to_string_pretty(&bundle) {
        Ok(body) => body,
        Err(e) => {
            log::error!("Failed to serialize library export: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed");
        }
    };

    let filename = format!(
        "legal-library-export-{}.json",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    log::info!(
        "Exported legal library ({} documents, {} procedures)",
        bundle.legal_library_items.as_ref().map_or(0, Vec::len),
        bundle.procedures.as_ref().map_or(0, Vec::len)
    );

    HttpResponse::Ok()
        .content_type("application/json")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

fn import_document(state: &AppState, item: &LibraryDocument, tally: &mut ImportTally) {
    let Some(title) = non_empty(&item.title) else {
        tally.errors.push("Untitled document: Title is required".to_string());
        return;
    };

    match state.db.document_title_exists(title) {
        Ok(true) => {
            tally.skipped += 1;
            return;
        }
        Ok(false) => {}
        Err(e) => {
            tally.errors.push(format!("{}: {}", title, e));
            return;
        }
    }

    let (Some(doc_type), Some(authority), Some(issue_date), Some(effective_date), Some(category)) = (
        non_empty(&item.doc_type),
        non_empty(&item.issued_by),
        non_empty(&item.issued_date),
        non_empty(&item.effective_date),
        non_empty(&item.category),
    ) else {
        tally.errors.push(format!("{}: Missing required fields", title));
        return;
    };

    let doc = NewLegalDocument {
        title: title.to_string(),
        doc_number: non_empty(&item.document_number).map(str::to_string),
        doc_type: doc_type.to_string(),
        authority: authority.to_string(),
        issue_date: issue_date.to_string(),
        effective_date: effective_date.to_string(),
        summary: non_empty(&item.summary).map(str::to_string),
        content: json!({
            "raw": item.content.as_deref().unwrap_or_default(),
            "chapters": item.chapters,
            "source_urls": item.source_urls,
        }),
        tags: item.tags.clone(),
        category: category.to_string(),
        status: "active".to_string(),
    };

    match state.db.create_document(&doc) {
        Ok(_) => tally.imported += 1,
        Err(e) => {
            log::warn!("Failed to import document {}: {}", title, e);
            tally.errors.push(format!("{}: {}", title, e));
        }
    }
}

fn import_procedure(state: &AppState, item: &LibraryProcedure, tally: &mut ImportTally) {
    let Some(title) = non_empty(&item.title) else {
        tally.errors.push("Untitled procedure: Title is required".to_string());
        return;
    };

    match state.db.procedure_title_exists(title) {
        Ok(true) => {
            tally.skipped += 1;
            return;
        }
        Ok(false) => {}
        Err(e) => {
            tally.errors.push(format!("{}: {}", title, e));
            return;
        }
    }

    let (Some(authority), Some(time_est), Some(category)) = (
        non_empty(&item.authority),
        non_empty(&item.estimated_time),
        non_empty(&item.category),
    ) else {
        tally.errors.push(format!("{}: Missing required fields", title));
        return;
    };

    let procedure = NewProcedure {
        title: title.to_string(),
        authority: authority.to_string(),
        time_est: time_est.to_string(),
        category: category.to_string(),
        steps: item.steps.clone().unwrap_or_else(|| json!([])),
        documents: json!([]),
        fees: non_empty(&item.fees).map(str::to_string),
        notes: non_empty(&item.description).map(str::to_string),
        tags: item.tags.clone(),
        status: "active".to_string(),
    };

    match state.db.create_procedure(&procedure) {
        Ok(_) => tally.imported += 1,
        Err(e) => {
            log::warn!("Failed to import procedure {}: {}", title, e);
            tally.errors.push(format!("{}: {}", title, e));
        }
    }
}

/// Items whose title already exists are skipped, never overwritten
async fn import_library(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LibraryBundle>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let mut results = ImportResults::default();
    for item in body.legal_library_items.iter().flatten() {
        import_document(&state, item, &mut results.documents);
    }
    for item in body.procedures.iter().flatten() {
        import_procedure(&state, item, &mut results.procedures);
    }

    let message = results.message();
    log::info!("Legal library import: {}", message);

    let mut response = json!({
        "success": !results.has_errors() || results.imported() > 0,
        "message": message,
        "results": results,
    });
    if results.has_errors() {
        response["errors"] = json!({
            "documents": results.documents.errors,
            "procedures": results.procedures.errors,
        });
    }
    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_token, bearer, init_app, test_state};
    use actix_web::test;

    fn sample_document(title: &str) -> NewLegalDocument {
        NewLegalDocument {
            title: title.to_string(),
            doc_number: Some("91/2015/QH13".to_string()),
            doc_type: "law".to_string(),
            authority: "Quốc hội".to_string(),
            issue_date: "2015-11-24".to_string(),
            effective_date: "2017-01-01".to_string(),
            summary: None,
            content: json!({ "raw": "Điều 1. Phạm vi điều chỉnh", "chapters": ["Chương I"], "source_urls": ["https://vbpl.vn"] }),
            tags: vec!["dân sự".to_string()],
            category: "civil".to_string(),
            status: "active".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_slugify_keeps_ascii_word_characters() {
        assert_eq!(slugify("Civil Code 2015 (amended)"), "civil-code-2015-amended");
        assert_eq!(slugify("  Luật  Đất đai "), "-lut-t-ai-");
        assert_eq!(slugify("snake_case-ok"), "snake_case-ok");
    }

    #[actix_web::test]
    async fn test_export_maps_fields_and_sets_attachment() {
        let state = test_state();
        let token = admin_token(&state);
        state.db.create_document(&sample_document("Civil Code")).unwrap();
        state.db.create_document(&sample_document("Land Law")).unwrap();
        let app = init_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/admin/legal-library/export?type=documents")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let disposition = resp
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"legal-library-export-"));

        let body: Value = test::read_body_json(resp).await;
        assert!(body.get("procedures").is_none());
        assert_eq!(body["legalLibraryItems"][0]["title"], "Land Law");
        let item = &body["legalLibraryItems"][1];
        assert_eq!(item["slug"], "civil-code");
        assert_eq!(item["documentNumber"], "91/2015/QH13");
        assert_eq!(item["issuedBy"], "Quốc hội");
        assert_eq!(item["content"], "Điều 1. Phạm vi điều chỉnh");
        assert_eq!(item["source_urls"][0], "https://vbpl.vn");

        let req = test::TestRequest::get()
            .uri("/api/admin/legal-library/export?type=videos")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_import_skips_existing_and_collects_errors() {
        let state = test_state();
        let token = admin_token(&state);
        state.db.create_document(&sample_document("Civil Code")).unwrap();
        let app = init_app!(state);

        let payload = json!({
            "legalLibraryItems": [
                { "title": "Civil Code", "type": "law", "issuedBy": "Quốc hội", "issuedDate": "2015-11-24",
                  "effectiveDate": "2017-01-01", "category": "civil", "tags": [], "content": "x" },
                { "title": "Land Law", "type": "law", "issuedBy": "Quốc hội", "issuedDate": "2024-01-18",
                  "effectiveDate": "2024-08-01", "category": "land", "tags": ["đất đai"], "content": "Điều 1",
                  "chapters": ["Chương I"] },
                { "title": "Broken", "type": "law" }
            ],
            "procedures": [
                { "title": "Đăng ký khai sinh", "authority": "UBND cấp xã", "estimatedTime": "1 ngày",
                  "category": "civil", "tags": [], "description": "Miễn phí", "steps": [{ "title": "Nộp hồ sơ" }] }
            ]
        });
        let req = test::TestRequest::post()
            .uri("/api/admin/legal-library/import")
            .insert_header(bearer(&token))
            .set_json(payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(
            body["message"],
            "Imported 1 documents, Skipped 1 existing documents, Imported 1 procedures"
        );
        assert_eq!(body["results"]["documents"]["skipped"], 1);
        assert_eq!(body["errors"]["documents"][0], "Broken: Missing required fields");

        let imported = state.db.all_procedures().unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].notes.as_deref(), Some("Miễn phí"));
        assert_eq!(imported[0].steps[0]["title"], "Nộp hồ sơ");

        let land = state
            .db
            .all_documents()
            .unwrap()
            .into_iter()
            .find(|d| d.title == "Land Law")
            .unwrap();
        assert_eq!(land.content["raw"], "Điều 1");
        assert_eq!(land.status, "active");
    }

    #[actix_web::test]
    async fn test_import_requires_admin() {
        let state = test_state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/admin/legal-library/import")
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }
}
