use std::env;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "./.db/legalhub.db";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
/// One year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Environment variables holding Gemini keys, in rotation order
const API_KEY_VARS: [&str; 4] = [
    "GOOGLE_API_KEY",
    "GOOGLE_API_KEY_2",
    "GOOGLE_API_KEY_3",
    "GOOGLE_API_KEY_4",
];

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub google_api_keys: Vec<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub session_ttl_hours: i64,
    pub frontend_dist: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let google_api_keys = API_KEY_VARS.iter().filter_map(|name| non_empty(name)).collect();

        Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            google_api_keys,
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            admin_email: non_empty("ADMIN_EMAIL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            session_ttl_hours: session_ttl(parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)),
            frontend_dist: non_empty("FRONTEND_DIST"),
        }
    }
}

fn session_ttl(hours: i64) -> i64 {
    if (1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        hours
    } else {
        log::warn!(
            "SESSION_TTL_HOURS must be between 1 and {} (got {}), using {}",
            MAX_SESSION_TTL_HOURS,
            hours,
            DEFAULT_SESSION_TTL_HOURS
        );
        DEFAULT_SESSION_TTL_HOURS
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{} must be a valid number (got {:?}), using {}", name, raw, default);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "./.db/legalhub.db");
        assert!(config.google_api_keys.is_empty());
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.session_ttl_hours, 168);
        assert!(config.admin_email.is_none());
        assert!(config.frontend_dist.is_none());
    }

    #[test]
    fn test_api_keys_skip_empty_values() {
        let config = config_from(&[
            ("GOOGLE_API_KEY", "key-one"),
            ("GOOGLE_API_KEY_2", "  "),
            ("GOOGLE_API_KEY_3", "key-three"),
        ]);
        assert_eq!(config.google_api_keys, vec!["key-one", "key-three"]);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("SESSION_TTL_HOURS", "-x")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, 168);

        let config = config_from(&[("PORT", "3001"), ("GEMINI_BASE_URL", "http://localhost:9/")]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.gemini_base_url, "http://localhost:9");
    }

    #[test]
    fn test_session_ttl_out_of_range_falls_back() {
        for raw in ["0", "-1", "9223372036854775"] {
            let config = config_from(&[("SESSION_TTL_HOURS", raw)]);
            assert_eq!(config.session_ttl_hours, DEFAULT_SESSION_TTL_HOURS, "value {}", raw);
        }
        let config = config_from(&[("SESSION_TTL_HOURS", "8760")]);
        assert_eq!(config.session_ttl_hours, 8760);
        let config = config_from(&[("SESSION_TTL_HOURS", "12")]);
        assert_eq!(config.session_ttl_hours, 12);
    }
}
