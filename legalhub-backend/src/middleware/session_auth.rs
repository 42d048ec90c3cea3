// Admin session authentication
// Protected admin handlers call `require_admin` first and return its error
// response unchanged when the request carries no valid session.

use actix_web::{HttpRequest, HttpResponse};

use crate::db::Database;
use crate::models::Session;

/// Cookie holding the admin session token
pub const SESSION_COOKIE: &str = "admin_session";

/// Session token from `Authorization: Bearer ...` or the session cookie
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    bearer.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|s| !s.is_empty())
    })
}

pub fn require_admin(db: &Database, req: &HttpRequest) -> Result<Session, HttpResponse> {
    let token = extract_token(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Unauthorized"
        }))
    })?;

    match db.validate_session(&token) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Invalid or expired session"
        }))),
        Err(e) => {
            log::error!("Session validation error: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Internal server error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_token_sources() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc"))
            .cookie(Cookie::new(SESSION_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc"));

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("cookie-token"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic xyz"))
            .to_http_request();
        assert_eq!(extract_token(&req), None);
    }
}
