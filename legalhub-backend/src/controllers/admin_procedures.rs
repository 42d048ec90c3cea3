use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::Value;

use crate::db::AdminProcedureQuery;
use crate::middleware::session_auth::require_admin;
use crate::models::{NewProcedure, ProcedureInput};
use crate::AppState;

use super::admin_documents::{status_filter, DEFAULT_STATUS};
use super::{bad_request, db_failure, filter_value, non_empty, not_found};

#[derive(Deserialize)]
pub struct AdminListParams {
    search: Option<String>,
    category: Option<String>,
    status: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/procedures")
            .route(web::get().to(list_procedures))
            .route(web::post().to(create_procedure)),
    );
    cfg.service(
        web::resource("/api/admin/procedures/{id}")
            .route(web::get().to(get_procedure))
            .route(web::put().to(update_procedure))
            .route(web::delete().to(delete_procedure)),
    );
}

fn list_or_empty(value: &Option<Value>) -> Value {
    value
        .clone()
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

/// Validated row values; creation additionally requires `steps`
fn to_new_procedure(input: &ProcedureInput, require_steps: bool) -> Option<NewProcedure> {
    let title = non_empty(&input.title)?;
    let authority = non_empty(&input.authority)?;
    let time_est = non_empty(&input.time_est)?;
    let category = non_empty(&input.category)?;
    if require_steps && input.steps.as_ref().is_none_or(Value::is_null) {
        return None;
    }

    Some(NewProcedure {
        title: title.to_string(),
        authority: authority.to_string(),
        time_est: time_est.to_string(),
        category: category.to_string(),
        steps: list_or_empty(&input.steps),
        documents: list_or_empty(&input.documents),
        fees: non_empty(&input.fees).map(str::to_string),
        notes: non_empty(&input.notes).map(str::to_string),
        tags: input.tags.clone().unwrap_or_default(),
        status: non_empty(&input.status).unwrap_or(DEFAULT_STATUS).to_string(),
    })
}

async fn list_procedures(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<AdminListParams>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let query = AdminProcedureQuery {
        search: non_empty(&params.search).map(str::to_string),
        category: filter_value(&params.category),
        status: status_filter(&params.status),
    };

    match state.db.list_procedures(&query) {
        Ok(procedures) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "procedures": procedures
        })),
        Err(e) => db_failure("Failed to fetch procedures", e),
    }
}

async fn create_procedure(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProcedureInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(procedure) = to_new_procedure(&body, true) else {
        return bad_request("Missing required fields");
    };

    match state.db.create_procedure(&procedure) {
        Ok(procedure) => {
            log::info!("Created procedure {} ({})", procedure.id, procedure.title);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "procedure": procedure
            }))
        }
        Err(e) => db_failure("Failed to create procedure", e),
    }
}

async fn get_procedure(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_procedure(&path) {
        Ok(Some(procedure)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "procedure": procedure
        })),
        Ok(None) => not_found("Procedure not found"),
        Err(e) => db_failure("Failed to fetch procedure", e),
    }
}

async fn update_procedure(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ProcedureInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(procedure) = to_new_procedure(&body, false) else {
        return bad_request("Missing required fields");
    };

    match state.db.update_procedure(&path, &procedure) {
        Ok(Some(procedure)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "procedure": procedure
        })),
        Ok(None) => not_found("Procedure not found"),
        Err(e) => db_failure("Failed to update procedure", e),
    }
}

async fn delete_procedure(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.delete_procedure(&path) {
        Ok(true) => {
            log::info!("Deleted procedure {}", path);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Procedure deleted"
            }))
        }
        Ok(false) => not_found("Procedure not found"),
        Err(e) => db_failure("Failed to delete procedure", e),
    }
}
