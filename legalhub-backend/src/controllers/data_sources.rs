use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::middleware::session_auth::require_admin;
use crate::models::DataSourceUpdate;
use crate::AppState;

use super::{db_failure, not_found};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/data-sources").route(web::get().to(list_sources)),
    );
    cfg.service(
        web::resource("/api/admin/data-sources/{id}").route(web::put().to(update_source)),
    );
}

async fn list_sources(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.list_data_sources() {
        Ok(sources) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "data": sources
        })),
        Err(e) => db_failure("Failed to fetch data sources", e),
    }
}

/// Mostly used to reorder sources by priority
async fn update_source(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<DataSourceUpdate>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.update_data_source(&path, &body) {
        Ok(Some(source)) => {
            log::debug!(
                "Data source {} now priority {} (enabled: {})",
                source.id,
                source.priority,
                source.is_enabled
            );
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "data": source
            }))
        }
        Ok(None) => not_found("Data source not found"),
        Err(e) => db_failure("Failed to update data source", e),
    }
}
