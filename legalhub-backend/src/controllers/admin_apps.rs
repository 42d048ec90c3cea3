use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::template;
use crate::db::AppQuery;
use crate::middleware::session_auth::require_admin;
use crate::models::{DailyStats, MiniApp, MiniAppInput, NewMiniApp, StatTotals};
use crate::AppState;

use super::{bad_request, db_failure, filter_value, non_empty, not_found};

const DEFAULT_CATEGORY: &str = "other";
const DRAFT_STATUS: &str = "draft";
/// Daily rows summed into the stats totals
const STATS_WINDOW_DAYS: i64 = 30;

#[derive(Deserialize)]
pub struct AdminListParams {
    search: Option<String>,
    category: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    new_slug: Option<String>,
}

#[derive(Serialize)]
pub struct AppHeader {
    id: String,
    slug: String,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    success: bool,
    app: AppHeader,
    totals: StatTotals,
    daily_stats: Vec<DailyStats>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/admin/apps")
            .route(web::get().to(list_apps))
            .route(web::post().to(create_app)),
    );
    cfg.service(
        web::resource("/api/admin/apps/{id}")
            .route(web::get().to(get_app))
            .route(web::put().to(update_app))
            .route(web::delete().to(delete_app)),
    );
    cfg.service(web::resource("/api/admin/apps/{id}/stats").route(web::get().to(get_stats)));
    cfg.service(web::resource("/api/admin/apps/{id}/clone").route(web::post().to(clone_app)));
}

fn to_new_app(input: &MiniAppInput) -> Option<NewMiniApp> {
    let slug = non_empty(&input.slug)?;
    let name = non_empty(&input.name)?;
    let app_type = non_empty(&input.app_type)?;
    let prompt_template = non_empty(&input.prompt_template)?;
    let input_schema = input.input_schema.clone().filter(|s| !s.is_null())?;
    let present = |v: &Option<Value>| v.clone().filter(|v| !v.is_null());

    Some(NewMiniApp {
        slug: slug.to_string(),
        name: name.to_string(),
        description: non_empty(&input.description).map(str::to_string),
        category: non_empty(&input.category).unwrap_or(DEFAULT_CATEGORY).to_string(),
        status: non_empty(&input.status).unwrap_or(DRAFT_STATUS).to_string(),
        app_type: app_type.to_string(),
        input_schema,
        prompt_template: prompt_template.to_string(),
        output_schema: present(&input.output_schema),
        render_config: present(&input.render_config),
        share_config: present(&input.share_config),
        limits: present(&input.limits),
        temperature: input.temperature,
        max_tokens: input.max_tokens,
    })
}

/// Template placeholders with no matching input field
fn uncovered_placeholders(app: &MiniApp) -> Vec<String> {
    let fields = app.input_fields();
    template::placeholders(&app.prompt_template)
        .into_iter()
        .filter(|name| !fields.iter().any(|f| &f.name == name))
        .collect()
}

fn warn_uncovered(app: &MiniApp) {
    let missing = uncovered_placeholders(app);
    if !missing.is_empty() {
        log::warn!(
            "App {} template uses placeholders without input fields: {}",
            app.slug,
            missing.join(", ")
        );
    }
}

async fn list_apps(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<AdminListParams>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let query = AppQuery {
        search: non_empty(&params.search).map(str::to_string),
        category: filter_value(&params.category),
        status: filter_value(&params.status),
        limit: None,
        offset: 0,
    };

    match state.db.list_apps(&query) {
        Ok(apps) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "apps": apps
        })),
        Err(e) => db_failure("Failed to fetch apps", e),
    }
}

async fn create_app(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<MiniAppInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(new_app) = to_new_app(&body) else {
        return bad_request("Missing required fields");
    };

    match state.db.slug_taken(&new_app.slug, None) {
        Ok(true) => return bad_request("Slug already exists"),
        Ok(false) => {}
        Err(e) => return db_failure("Failed to check slug", e),
    }

    match state.db.create_app(&new_app) {
        Ok(app) => {
            log::info!("Created app {} ({})", app.slug, app.id);
            warn_uncovered(&app);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "app": app
            }))
        }
        Err(e) => db_failure("Failed to create app", e),
    }
}

async fn get_app(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.get_app(&path) {
        Ok(Some(app)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "app": app
        })),
        Ok(None) => not_found("App not found"),
        Err(e) => db_failure("Failed to fetch app", e),
    }
}

async fn update_app(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<MiniAppInput>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(new_app) = to_new_app(&body) else {
        return bad_request("Missing required fields");
    };

    match state.db.slug_taken(&new_app.slug, Some(&path)) {
        Ok(true) => return bad_request("Slug already exists"),
        Ok(false) => {}
        Err(e) => return db_failure("Failed to check slug", e),
    }

    match state.db.update_app(&path, &new_app) {
        Ok(Some(app)) => {
            warn_uncovered(&app);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "app": app
            }))
        }
        Ok(None) => not_found("App not found"),
        Err(e) => db_failure("Failed to update app", e),
    }
}

async fn delete_app(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    match state.db.delete_app(&path) {
        Ok(true) => {
            log::info!("Deleted app {}", path);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "App deleted"
            }))
        }
        Ok(false) => not_found("App not found"),
        Err(e) => db_failure("Failed to delete app", e),
    }
}

async fn get_stats(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let app = match state.db.get_app(&path) {
        Ok(Some(app)) => app,
        Ok(None) => return not_found("App not found"),
        Err(e) => return db_failure("Failed to fetch app", e),
    };

    let daily_stats = match state.db.daily_stats(&app.id, STATS_WINDOW_DAYS) {
        Ok(days) => days,
        Err(e) => return db_failure("Failed to fetch app stats", e),
    };
    let results = match state.db.count_results_for_app(&app.id) {
        Ok(count) => count,
        Err(e) => return db_failure("Failed to count app results", e),
    };

    HttpResponse::Ok().json(StatsResponse {
        success: true,
        totals: StatTotals::from_days(&daily_stats, results),
        app: AppHeader {
            id: app.id,
            slug: app.slug,
            name: app.name,
        },
        daily_stats,
    })
}

async fn clone_app(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CloneRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state.db, &req) {
        return resp;
    }

    let Some(new_slug) = non_empty(&body.new_slug) else {
        return bad_request("New slug is required");
    };

    let original = match state.db.get_app(&path) {
        Ok(Some(app)) => app,
        Ok(None) => return not_found("App not found"),
        Err(e) => return db_failure("Failed to fetch app", e),
    };

    match state.db.slug_taken(new_slug, None) {
        Ok(true) => return bad_request("Slug already exists"),
        Ok(false) => {}
        Err(e) => return db_failure("Failed to check slug", e),
    }

    let copy = NewMiniApp {
        slug: new_slug.to_string(),
        name: format!("{} (Copy)", original.name),
        status: DRAFT_STATUS.to_string(),
        ..NewMiniApp::from(&original)
    };

    match state.db.create_app(&copy) {
        Ok(app) => {
            log::info!("Cloned app {} as {}", original.slug, app.slug);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "app": app
            }))
        }
        Err(e) => db_failure("Failed to clone app", e),
    }
}
