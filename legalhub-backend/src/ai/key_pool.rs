//! Gemini API key rotation
//!
//! Hands out the least-used key among those that are healthy. A key that
//! errored is skipped for a cooldown window after its last use, and a key
//! that errored too many times is skipped until every key is exhausted, at
//! which point all error counts are reset.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

/// How long an errored key rests after it was last handed out
const COOLDOWN: Duration = Duration::from_secs(60);
/// Error count at which a key is taken out of rotation
const MAX_ERRORS: u32 = 3;
/// Characters of a key that may appear in logs and stats
const PREFIX_LEN: usize = 15;

#[derive(Debug, Clone)]
struct KeyState {
    key: String,
    usage_count: u64,
    last_used: Option<Instant>,
    errors: u32,
}

impl KeyState {
    fn is_available(&self, now: Instant) -> bool {
        if self.errors >= MAX_ERRORS {
            return false;
        }
        let cooling_down = self
            .last_used
            .map(|at| now.saturating_duration_since(at) < COOLDOWN)
            .unwrap_or(false);
        !(self.errors > 0 && cooling_down)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    pub key_prefix: String,
    pub usage_count: u64,
    pub errors: u32,
    /// Seconds since the key was last handed out
    pub last_used: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total_keys: usize,
    pub keys: Vec<KeyStats>,
}

/// Process-wide key pool; counters live in memory only
pub struct ApiKeyPool {
    keys: Mutex<Vec<KeyState>>,
}

/// First characters of a key followed by `...`
pub fn key_prefix(key: &str) -> String {
    let prefix: String = key.chars().take(PREFIX_LEN).collect();
    format!("{}...", prefix)
}

impl ApiKeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        log::info!("[KEYS] Loaded {} Google API key(s) for rotation", keys.len());
        let keys = keys
            .into_iter()
            .map(|key| KeyState {
                key,
                usage_count: 0,
                last_used: None,
                errors: 0,
            })
            .collect();
        Self {
            keys: Mutex::new(keys),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the next key to use
    pub fn next_key(&self) -> Option<String> {
        self.next_key_at(Instant::now())
    }

    fn next_key_at(&self, now: Instant) -> Option<String> {
        let mut keys = self.keys.lock();
        if keys.is_empty() {
            return None;
        }

        // min_by_key keeps the first of equal elements, so ties go to configured order
        let selected = keys
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_available(now))
            .min_by_key(|(_, state)| state.usage_count)
            .map(|(index, _)| index);

        match selected {
            Some(index) => {
                let state = &mut keys[index];
                state.usage_count += 1;
                state.last_used = Some(now);
                Some(state.key.clone())
            }
            None => {
                log::warn!("[KEYS] All API keys exhausted, resetting error counts");
                for state in keys.iter_mut() {
                    state.errors = 0;
                }
                Some(keys[0].key.clone())
            }
        }
    }

    /// Count a failed call against `key`
    pub fn report_error(&self, key: &str, reason: &str) {
        let mut keys = self.keys.lock();
        if let Some(state) = keys.iter_mut().find(|s| s.key == key) {
            state.errors += 1;
            log::error!(
                "[KEYS] API key error ({} errors): {} - {}",
                state.errors,
                key_prefix(key),
                reason
            );
        }
    }

    /// Clear the error count of `key` after a successful call
    pub fn report_success(&self, key: &str) {
        let mut keys = self.keys.lock();
        if let Some(state) = keys.iter_mut().find(|s| s.key == key) {
            if state.errors > 0 {
                log::info!("[KEYS] API key recovered: {}", key_prefix(key));
                state.errors = 0;
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let keys = self.keys.lock();
        let now = Instant::now();
        PoolStats {
            total_keys: keys.len(),
            keys: keys
                .iter()
                .map(|state| KeyStats {
                    key_prefix: key_prefix(&state.key),
                    usage_count: state.usage_count,
                    errors: state.errors,
                    last_used: state
                        .last_used
                        .map(|at| now.saturating_duration_since(at).as_secs()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(keys: &[&str]) -> ApiKeyPool {
        ApiKeyPool::new(keys.iter().map(|k| k.to_string()).collect())
    }

    #[test]
    fn test_empty_pool() {
        let pool = pool(&[]);
        assert!(pool.is_empty());
        assert_eq!(pool.next_key(), None);
        assert_eq!(pool.stats().total_keys, 0);
    }

    #[test]
    fn test_least_used_with_ties_in_order() {
        let pool = pool(&["a", "b", "c"]);
        let picks: Vec<_> = (0..6).filter_map(|_| pool.next_key()).collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_errored_key_cools_down() {
        let pool = pool(&["a", "b"]);
        let start = Instant::now();

        assert_eq!(pool.next_key_at(start).as_deref(), Some("a"));
        pool.report_error("a", "429");

        // a is cooling down, so b is picked even after it becomes more used
        assert_eq!(pool.next_key_at(start).as_deref(), Some("b"));
        assert_eq!(pool.next_key_at(start).as_deref(), Some("b"));

        let later = start + COOLDOWN + Duration::from_secs(1);
        assert_eq!(pool.next_key_at(later).as_deref(), Some("a"));
    }

    #[test]
    fn test_max_errors_excludes_key() {
        let pool = pool(&["a", "b"]);
        let start = Instant::now();
        for _ in 0..MAX_ERRORS {
            pool.report_error("a", "auth");
        }

        let later = start + COOLDOWN * 2;
        for _ in 0..3 {
            assert_eq!(pool.next_key_at(later).as_deref(), Some("b"));
        }
    }

    #[test]
    fn test_exhaustion_resets_errors_without_usage() {
        let pool = pool(&["a", "b"]);
        let now = Instant::now();
        pool.next_key_at(now);
        pool.next_key_at(now);
        pool.report_error("a", "x");
        pool.report_error("b", "x");

        assert_eq!(pool.next_key_at(now).as_deref(), Some("a"));
        let stats = pool.stats();
        assert!(stats.keys.iter().all(|k| k.errors == 0));
        assert!(stats.keys.iter().all(|k| k.usage_count == 1));
    }

    #[test]
    fn test_success_resets_errors_and_unknown_keys_ignored() {
        let pool = pool(&["AIzaSyA-very-long-key-value"]);
        pool.report_error("AIzaSyA-very-long-key-value", "boom");
        pool.report_error("not-in-pool", "boom");
        pool.report_success("not-in-pool");
        assert_eq!(pool.stats().keys[0].errors, 1);

        pool.report_success("AIzaSyA-very-long-key-value");
        let stats = pool.stats();
        assert_eq!(stats.keys[0].errors, 0);
        assert_eq!(stats.keys[0].key_prefix, "AIzaSyA-very-lo...");
        assert_eq!(stats.keys[0].last_used, None);
    }
}
