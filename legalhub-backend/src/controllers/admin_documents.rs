use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::db::AdminDocumentQuery;
use crate::middleware::session_auth::require_admin;
use crate::models::{LegalDocument, LegalDocumentInput, NewLegalDocument};
use crate::AppState;

use super::{bad_request, db_failure, filter_value, non_empty, not_found};

pub const DEFAULT_STATUS: &str = "active";

#[derive(Deserialize)]
pub struct AdminListParams {
    search: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    status: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/documents")
            .route(web::get().to(list_documents))
            .route(web::post().to(create_document)),
    );
    cfg.service(
        web::resource("/api/admin/documents/{id}")
            .route(web::get().to(get_document))
            .route(web::put().to(update_document))
            .route(web::delete().to(delete_document)),
    );
}

/// `status` filter for admin lists: missing means active, `all` means any
pub fn status_filter(status: &Option<String>) -> Option<String> {
    match non_empty(status) {
        None => Some(DEFAULT_STATUS.to_string()),
        Some(_) => filter_value(status),
    }
}

/// Validated row values; dates missing on update keep their stored values
fn to_new_document(
    input: &LegalDocumentInput,
    current: Option<&LegalDocument>,
) -> Option<NewLegalDocument> {
    let title = non_empty(&input.title)?;
    let doc_type = non_empty(&input.doc_type)?;
    let authority = non_empty(&input.authority)?;
    let category = non_empty(&input.category)?;
    let issue_date = non_empty(&input.issue_date)
        .map(str::to_string)
        .or_else(|| current.map(|c| c.issue_date.clone()))?;
    let effective_date = non_empty(&input.effective_date)
        .map(str::to_string)
        .or_else(|| current.map(|c| c.effective_date.clone()))?;

    Some(NewLegalDocument {
        title: title.to_string(),
        doc_number: non_empty(&input.doc_number).map(str::to_string),
        doc_type: doc_type.to_string(),
        authority: authority.to_string(),
        issue_date,
        effective_date,
        summary: non_empty(&input.summary).map(str::to_string),
        content: input
            .content
            .clone()
            .filter(|c| !c.is_null())
            .unwrap_or_else(|| serde_json::json!({})),
        tags: input.tags.clone().unwrap_or_default(),
        category: category.to_string(),
        status: non_empty(&input.status).unwrap_or(DEFAULT_STATUS).to_string(),
    })
}

async fn list_documents(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<AdminListParams>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let query = AdminDocumentQuery {
        search: non_empty(&params.search).map(str::to_string),
        category: filter_value(&params.category),
        doc_type: filter_value(&params.doc_type),
        status: status_filter(&params.status),
    };

    match state.db.list_documents(&query) {
        Ok(documents) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "documents": documents
        })),
        Err(e) => db_failure("Failed to fetch documents", e),
    }
}

async fn create_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LegalDocumentInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(document) = to_new_document(&body, None) else {
        return bad_request("Missing required fields");
    };

    match state.db.create_document(&document) {
        Ok(document) => {
            log::info!("Created legal document {} ({})", document.id, document.title);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "document": document
            }))
        }
        Err(e) => db_failure("Failed to create document", e),
    }
}

async fn get_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_document(&path) {
        Ok(Some(document)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "document": document
        })),
        Ok(None) => not_found("Document not found"),
        Err(e) => db_failure("Failed to fetch document", e),
    }
}

async fn update_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<LegalDocumentInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let current = match state.db.get_document(&path) {
        Ok(Some(current)) => current,
        Ok(None) => return not_found("Document not found"),
        Err(e) => return db_failure("Failed to fetch document", e),
    };

    let Some(document) = to_new_document(&body, Some(&current)) else {
        return bad_request("Missing required fields");
    };

    match state.db.update_document(&current.id, &document) {
        Ok(Some(document)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "document": document
        })),
        Ok(None) => not_found("Document not found"),
        Err(e) => db_failure("Failed to update document", e),
    }
}

async fn delete_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.delete_document(&path) {
        Ok(true) => {
            log::info!("Deleted legal document {}", path);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Document deleted"
            }))
        }
        Ok(false) => not_found("Document not found"),
        Err(e) => db_failure("Failed to delete document", e),
    }
}
