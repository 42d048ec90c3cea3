use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::middleware::session_auth::{extract_token, require_admin, SESSION_COOKIE};
use crate::AppState;

use super::{bad_request, db_failure, non_empty};

const INVALID_CREDENTIALS: &str = "Email hoặc mật khẩu không đúng";

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
pub struct AdminInfo {
    id: String,
    email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    success: bool,
    token: String,
    expires_at: i64,
    admin: AdminInfo,
}

#[derive(Serialize)]
pub struct SessionResponse {
    success: bool,
    authenticated: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/admin/login").route(web::post().to(login)));
    cfg.service(web::resource("/api/admin/logout").route(web::post().to(logout)));
    cfg.service(web::resource("/api/admin/session").route(web::get().to(check_session)));
    cfg.service(web::resource("/api/admin/check-auth").route(web::get().to(check_session)));
}

/// Argon2 PHC string for a password
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())?;
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Create the configured admin account when no admin exists yet
pub fn seed_admin(db: &Database, email: Option<&str>, password: Option<&str>) {
    let (Some(email), Some(password)) = (email, password) else {
        return;
    };

    match db.count_admins() {
        Ok(0) => {}
        Ok(_) => return,
        Err(e) => {
            log::error!("Failed to count admin accounts: {}", e);
            return;
        }
    }

    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Failed to hash admin password: {}", e);
            return;
        }
    };

    match db.create_admin(email, &hash) {
        Ok(admin) => log::info!("Created admin account {}", admin.email),
        Err(e) => log::error!("Failed to create admin account: {}", e),
    }
}

fn session_cookie(token: &str, max_age: CookieDuration) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .finish()
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let (Some(email), Some(password)) = (non_empty(&body.email), body.password.as_deref()) else {
        return bad_request("Email và mật khẩu là bắt buộc");
    };
    if password.is_empty() {
        return bad_request("Email và mật khẩu là bắt buộc");
    }

    let admin = match state.db.get_admin_by_email(email) {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            log::warn!("Admin login failed for unknown email");
            return super::error_response(
                actix_web::http::StatusCode::UNAUTHORIZED,
                INVALID_CREDENTIALS,
            );
        }
        Err(e) => return db_failure("Failed to load admin", e),
    };

    if !verify_password(password, &admin.password_hash) {
        log::warn!("Admin login failed for {}", admin.email);
        return super::error_response(actix_web::http::StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
    }

    match state.db.create_session(&admin.id, state.config.session_ttl_hours) {
        Ok(session) => {
            log::info!("Admin {} logged in", admin.email);
            let max_age = CookieDuration::hours(state.config.session_ttl_hours);
            HttpResponse::Ok()
                .cookie(session_cookie(&session.token, max_age))
                .json(LoginResponse {
                    success: true,
                    token: session.token,
                    expires_at: session.expires_at.timestamp(),
                    admin: AdminInfo {
                        id: admin.id,
                        email: admin.email,
                    },
                })
        }
        Err(e) => db_failure("Failed to create session", e),
    }
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = extract_token(&req) {
        if let Err(e) = state.db.delete_session(&token) {
            return db_failure("Failed to delete session", e);
        }
    }

    HttpResponse::Ok()
        .cookie(session_cookie("", CookieDuration::ZERO))
        .json(serde_json::json!({
            "success": true,
            "message": "Đã đăng xuất thành công"
        }))
}

async fn check_session(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match require_admin(&state.db, &req) {
        Ok(_) => HttpResponse::Ok().json(SessionResponse {
            success: true,
            authenticated: true,
        }),
        Err(resp) if resp.status().is_server_error() => resp,
        Err(_) => HttpResponse::Unauthorized().json(SessionResponse {
            success: false,
            authenticated: false,
        }),
    }
}
