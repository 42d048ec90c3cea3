use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = match state.db.ping() {
        Ok(()) => "ok",
        Err(e) => {
            log::error!("Health check database error: {}", e);
            "error"
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "database": database,
        "aiKeys": state.key_pool.len()
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{init_app, test_state};
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_health_reports_database_and_keys() {
        let state = test_state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["aiKeys"], 1);

        let req = test::TestRequest::get().uri("/api/version").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["version"], VERSION);
    }
}
