use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use crate::ai::key_pool::PoolStats;
use crate::db::DashboardCounts;
use crate::middleware::session_auth::require_admin;
use crate::AppState;

use super::db_failure;

#[derive(Serialize)]
pub struct DashboardResponse {
    success: bool,
    stats: DashboardCounts,
    timestamp: String,
}

#[derive(Serialize)]
pub struct KeyStatsResponse {
    success: bool,
    #[serde(flatten)]
    stats: PoolStats,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/admin/dashboard").route(web::get().to(get_dashboard)));
    cfg.service(web::resource("/api/admin/ai-keys").route(web::get().to(get_key_stats)));
}

async fn get_dashboard(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.dashboard_counts() {
        Ok(stats) => HttpResponse::Ok().json(DashboardResponse {
            success: true,
            stats,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
        Err(e) => db_failure("Failed to load dashboard counts", e),
    }
}

async fn get_key_stats(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    HttpResponse::Ok().json(KeyStatsResponse {
        success: true,
        stats: state.key_pool.stats(),
    })
}
