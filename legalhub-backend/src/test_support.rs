//! Shared fixtures for endpoint tests

use actix_web::web;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::ai::{AiError, ApiKeyPool, GenerationOptions, TextGenerator};
use crate::config::Config;
use crate::controllers::auth::seed_admin;
use crate::db::Database;
use crate::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Generator that records every prompt and returns a fixed reply
pub struct StubGenerator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<(String, GenerationOptions)>>,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Fails every call with `AiError::NoApiKeys`
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().map(|(prompt, _)| prompt.clone())
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String, AiError> {
        self.prompts.lock().push((prompt.to_string(), options));
        self.reply.clone().ok_or(AiError::NoApiKeys)
    }
}

pub fn test_state() -> web::Data<AppState> {
    test_state_with(StubGenerator::replying("Câu trả lời mẫu"))
}

/// In-memory database with a seeded admin and the given generator
pub fn test_state_with(generator: Arc<StubGenerator>) -> web::Data<AppState> {
    let config = Config::from_lookup(|name| match name {
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_string()),
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
        "GOOGLE_API_KEY" => Some("AIzaSyTEST-key-0000000000".to_string()),
        _ => None,
    });
    let db = Database::in_memory().expect("in-memory database");
    seed_admin(&db, config.admin_email.as_deref(), config.admin_password.as_deref());

    web::Data::new(AppState {
        db: Arc::new(db),
        key_pool: Arc::new(ApiKeyPool::new(config.google_api_keys.clone())),
        config,
        ai: generator,
    })
}

/// Session token for the seeded admin
pub fn admin_token(state: &AppState) -> String {
    let admin = state
        .db
        .get_admin_by_email(ADMIN_EMAIL)
        .expect("admin lookup")
        .expect("seeded admin");
    state
        .db
        .create_session(&admin.id, 1)
        .expect("create session")
        .token
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Initialise the full route table over the given state
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(crate::controllers::configure),
        )
        .await
    };
}

pub(crate) use init_app;
