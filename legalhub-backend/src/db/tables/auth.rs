//! Admin accounts and session database operations

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::sqlite::{format_timestamp, now_rfc3339, timestamp_at};
use super::super::Database;
use crate::config::MAX_SESSION_TTL_HOURS;
use crate::models::{AdminUser, Session};

impl Database {
    fn row_to_admin(row: &Row<'_>) -> SqliteResult<AdminUser> {
        Ok(AdminUser {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: timestamp_at(row, 3)?,
        })
    }

    fn row_to_session(row: &Row<'_>) -> SqliteResult<Session> {
        Ok(Session {
            id: row.get(0)?,
            token: row.get(1)?,
            admin_id: row.get(2)?,
            created_at: timestamp_at(row, 3)?,
            expires_at: timestamp_at(row, 4)?,
        })
    }

    pub fn count_admins(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM admin_users", [], |row| row.get(0))
    }

    /// Create an admin account; the hash is produced by the caller
    pub fn create_admin(&self, email: &str, password_hash: &str) -> SqliteResult<AdminUser> {
        let conn = self.conn.lock();
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();

        conn.execute(
            "INSERT INTO admin_users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, email.trim().to_lowercase(), password_hash, now],
        )?;

        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM admin_users WHERE id = ?1",
            [&id],
            Self::row_to_admin,
        )
    }

    /// Look up an admin by email (case-insensitive)
    pub fn get_admin_by_email(&self, email: &str) -> SqliteResult<Option<AdminUser>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM admin_users WHERE email = ?1",
            [email.trim().to_lowercase()],
            Self::row_to_admin,
        )
        .optional()
    }

    /// Create a new session for an admin
    pub fn create_session(&self, admin_id: &str, ttl_hours: i64) -> SqliteResult<Session> {
        let conn = self.conn.lock();
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS));

        conn.execute(
            "INSERT INTO auth_sessions (token, admin_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![token, admin_id, format_timestamp(&now), format_timestamp(&expires_at)],
        )?;

        Ok(Session {
            id: conn.last_insert_rowid(),
            token,
            admin_id: admin_id.to_string(),
            created_at: now,
            expires_at,
        })
    }

    /// Validate a session token, purging expired sessions first
    pub fn validate_session(&self, token: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock();
        let now = now_rfc3339();

        conn.execute("DELETE FROM auth_sessions WHERE expires_at <= ?1", [&now])?;

        conn.query_row(
            "SELECT id, token, admin_id, created_at, expires_at FROM auth_sessions WHERE token = ?1",
            [token],
            Self::row_to_session,
        )
        .optional()
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    #[cfg(test)]
    pub(crate) fn expire_session(&self, token: &str) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let past = format_timestamp(&(Utc::now() - Duration::hours(1)));
        conn.execute(
            "UPDATE auth_sessions SET expires_at = ?1 WHERE token = ?2",
            params![past, token],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let db = Database::in_memory().unwrap();
        let admin = db.create_admin("Admin@Example.com", "hash").unwrap();
        assert_eq!(admin.email, "admin@example.com");
        assert!(db.get_admin_by_email(" ADMIN@example.com ").unwrap().is_some());

        let session = db.create_session(&admin.id, 1).unwrap();
        let found = db.validate_session(&session.token).unwrap().unwrap();
        assert_eq!(found.admin_id, admin.id);

        db.expire_session(&session.token).unwrap();
        assert!(db.validate_session(&session.token).unwrap().is_none());
        assert!(!db.delete_session(&session.token).unwrap());
    }

    #[test]
    fn test_session_ttl_is_clamped() {
        let db = Database::in_memory().unwrap();
        let admin = db.create_admin("admin@example.com", "hash").unwrap();

        let short = db.create_session(&admin.id, -1).unwrap();
        assert!(db.validate_session(&short.token).unwrap().is_some());

        let long = db.create_session(&admin.id, i64::MAX / 1000).unwrap();
        let max = Utc::now() + Duration::hours(MAX_SESSION_TTL_HOURS) + Duration::minutes(1);
        assert!(long.expires_at <= max);
    }
}
