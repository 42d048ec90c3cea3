use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::ai::{template, GenerationOptions, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use crate::db::AppQuery;
use crate::models::app::PUBLISHED_STATUS;
use crate::models::{EventType, MiniApp, RunResult};
use crate::AppState;

use super::{ai_failure, bad_request, db_failure, filter_value, not_found, page};

#[derive(Deserialize)]
pub struct CatalogParams {
    category: Option<String>,
    published: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    event_type: Option<String>,
    result_id: Option<String>,
    metadata: Option<Value>,
}

#[derive(Deserialize)]
pub struct RunRequest {
    inputs: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    id: Option<String>,
    text: String,
    image_url: Option<String>,
}

#[derive(Serialize)]
pub struct AppRef {
    slug: String,
    name: String,
}

#[derive(Serialize)]
pub struct ResultWithApp {
    #[serde(flatten)]
    result: RunResult,
    app: Option<AppRef>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/apps").route(web::get().to(list_apps)));
    cfg.service(web::resource("/api/apps/{slug}").route(web::get().to(get_app)));
    cfg.service(web::resource("/api/apps/{slug}/events").route(web::post().to(record_event)));
    cfg.service(web::resource("/api/run/{slug}").route(web::post().to(run_app)));
    cfg.service(web::resource("/api/results/{id}").route(web::get().to(get_result)));
}

/// Load a publicly visible app or the 404/403 response for it
fn load_published(state: &AppState, slug: &str) -> Result<MiniApp, HttpResponse> {
    match state.db.get_app_by_slug(slug) {
        Ok(Some(app)) if app.is_published() => Ok(app),
        Ok(Some(_)) => Err(HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "App is not published",
            "isNotPublished": true
        }))),
        Ok(None) => Err(not_found("App not found")),
        Err(e) => Err(db_failure("Failed to fetch app", e)),
    }
}

/// Label of the first required field whose input is missing or blank
fn missing_required_field(app: &MiniApp, inputs: &Map<String, Value>) -> Option<String> {
    app.input_fields()
        .into_iter()
        .filter(|field| field.required)
        .find(|field| match inputs.get(&field.name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        })
        .map(|field| field.display_label().to_string())
}

fn generation_options(app: &MiniApp) -> GenerationOptions {
    GenerationOptions {
        temperature: app.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_output_tokens: app
            .max_tokens
            .and_then(|t| u32::try_from(t).ok())
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        model: None,
    }
}

async fn list_apps(state: web::Data<AppState>, params: web::Query<CatalogParams>) -> impl Responder {
    let (limit, offset) = page(&params.limit, &params.offset);
    let query = AppQuery {
        search: None,
        category: filter_value(&params.category),
        status: (params.published.as_deref() == Some("true")).then(|| PUBLISHED_STATUS.to_string()),
        limit: Some(limit),
        offset,
    };

    match state.db.list_app_summaries(&query) {
        Ok((apps, total)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "apps": apps,
            "total": total,
            "limit": limit,
            "offset": offset
        })),
        Err(e) => db_failure("Failed to fetch apps", e),
    }
}

async fn get_app(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app = match load_published(&state, &path) {
        Ok(app) => app,
        Err(resp) => return resp,
    };

    if let Err(e) = state.db.track_event(&app.id, EventType::View, None, None) {
        log::error!("Failed to record view for app {}: {}", app.slug, e);
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "app": app
    }))
}

async fn record_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<EventRequest>,
) -> impl Responder {
    let event_type = match body.event_type.as_deref().map(EventType::from_str) {
        Some(Ok(event_type)) if event_type.is_client_reportable() => event_type,
        _ => return bad_request("eventType must be one of: share, affiliate_click"),
    };

    let app = match load_published(&state, &path) {
        Ok(app) => app,
        Err(resp) => return resp,
    };

    match state.db.track_event(
        &app.id,
        event_type,
        body.result_id.as_deref(),
        body.metadata.as_ref(),
    ) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => db_failure("Failed to record app event", e),
    }
}

async fn run_app(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RunRequest>,
) -> impl Responder {
    let Some(Value::Object(inputs)) = &body.inputs else {
        return bad_request("Inputs object is required");
    };

    let app = match load_published(&state, &path) {
        Ok(app) => app,
        Err(resp) => return resp,
    };

    if let Some(label) = missing_required_field(&app, inputs) {
        return bad_request(&format!("Field \"{}\" is required", label));
    }

    let prompt = template::render(&app.prompt_template, inputs);
    log::info!("Running app {} ({} input fields)", app.slug, inputs.len());

    let text = match state.ai.generate(&prompt, generation_options(&app)).await {
        Ok(text) => text,
        Err(e) => {
            if let Err(db_err) = state.db.log_event(&app.id, EventType::Error, None, None) {
                log::error!("Failed to record error event: {}", db_err);
            }
            return ai_failure(&format!("Generation failed for app {}", app.slug), &e);
        }
    };

    let result_id = match state
        .db
        .create_result(&app.id, &Value::Object(inputs.clone()), &text)
    {
        Ok(result) => Some(result.id),
        Err(e) => {
            log::error!("Failed to store result for app {}: {}", app.slug, e);
            None
        }
    };

    if let Err(e) = state
        .db
        .track_event(&app.id, EventType::Submit, result_id.as_deref(), None)
    {
        log::error!("Failed to record submit for app {}: {}", app.slug, e);
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "result": RunOutput {
            id: result_id,
            text,
            image_url: None,
        }
    }))
}

async fn get_result(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let result = match state.db.get_result(&path) {
        Ok(Some(result)) => result,
        Ok(None) => return not_found("Result not found"),
        Err(e) => return db_failure("Failed to fetch result", e),
    };

    let app = match state.db.get_app(&result.app_id) {
        Ok(app) => app.map(|a| AppRef {
            slug: a.slug,
            name: a.name,
        }),
        Err(e) => return db_failure("Failed to fetch result app", e),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "result": ResultWithApp { result, app }
    }))
}
