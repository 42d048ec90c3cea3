use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::path::Path;
use std::sync::Arc;

mod ai;
mod config;
mod controllers;
mod db;
mod middleware;
mod models;
#[cfg(test)]
mod test_support;

use ai::{ApiKeyPool, GeminiClient, TextGenerator};
use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub key_pool: Arc<ApiKeyPool>,
    pub ai: Arc<dyn TextGenerator>,
}

/// SPA fallback handler - serves index.html for client-side routing
async fn spa_fallback(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    let dist = state.config.frontend_dist.as_deref().unwrap_or(".");
    Ok(NamedFile::open(Path::new(dist).join("index.html"))?)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url)
        .map_err(|e| io::Error::other(format!("Failed to initialize database: {}", e)))?;
    let db = Arc::new(db);

    controllers::auth::seed_admin(
        &db,
        config.admin_email.as_deref(),
        config.admin_password.as_deref(),
    );

    let key_pool = Arc::new(ApiKeyPool::new(config.google_api_keys.clone()));
    if key_pool.is_empty() {
        log::warn!("No GOOGLE_API_KEY configured; Q&A and mini-app runs will return 503");
    } else {
        log::info!("Loaded {} Gemini API keys (model {})", key_pool.len(), config.gemini_model);
    }

    let gemini = GeminiClient::new(&config.gemini_base_url, &config.gemini_model, key_pool.clone())
        .map_err(|e| io::Error::other(format!("Failed to build Gemini client: {}", e)))?;
    let ai: Arc<dyn TextGenerator> = Arc::new(gemini);

    let frontend_dist = config
        .frontend_dist
        .clone()
        .filter(|dist| Path::new(dist).join("index.html").exists());
    match (&config.frontend_dist, &frontend_dist) {
        (Some(_), Some(dist)) => log::info!("Serving frontend from {}", dist),
        (Some(dist), None) => log::warn!("FRONTEND_DIST {} has no index.html, not serving it", dist),
        _ => {}
    }

    log::info!("Starting server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                key_pool: Arc::clone(&key_pool),
                ai: Arc::clone(&ai),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure);

        if let Some(dist) = &frontend_dist {
            app = app.service(
                Files::new("/", dist.clone())
                    .index_file("index.html")
                    .default_handler(web::to(spa_fallback)),
            );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
