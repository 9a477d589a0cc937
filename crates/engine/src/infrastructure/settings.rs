//! Engine configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use charpick_domain::UserId;

use crate::infrastructure::jikan::DEFAULT_JIKAN_BASE_URL;
use crate::infrastructure::local_store::default_storage_path;

pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_METADATA_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub jikan_url: String,
    /// Remote document store base URL. `None` keeps documents in memory.
    pub document_store_url: Option<String>,
    pub document_store_token: Option<String>,
    pub storage_path: PathBuf,
    /// Bound on every metadata and document store call.
    pub remote_timeout: Duration,
    pub metadata_max_retries: u32,
    /// Signed-in user for this session, anonymous when absent.
    pub user_id: Option<UserId>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jikan_url: DEFAULT_JIKAN_BASE_URL.to_string(),
            document_store_url: None,
            document_store_token: None,
            storage_path: default_storage_path(),
            remote_timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
            metadata_max_retries: DEFAULT_METADATA_MAX_RETRIES,
            user_id: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset
    /// and unparsable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let defaults = Self::default();

        let remote_timeout_ms = var("CHARPICK_REMOTE_TIMEOUT_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS);

        let user_id = var("CHARPICK_USER_ID").and_then(|raw| match UserId::new(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring CHARPICK_USER_ID");
                None
            }
        });

        Self {
            jikan_url: var("CHARPICK_JIKAN_URL").unwrap_or(defaults.jikan_url),
            document_store_url: var("CHARPICK_DOCUMENT_STORE_URL"),
            document_store_token: var("CHARPICK_DOCUMENT_STORE_TOKEN"),
            storage_path: var("CHARPICK_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            remote_timeout: Duration::from_millis(remote_timeout_ms),
            metadata_max_retries: var("CHARPICK_METADATA_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_METADATA_MAX_RETRIES),
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.jikan_url, DEFAULT_JIKAN_BASE_URL);
        assert_eq!(config.document_store_url, None);
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
        assert_eq!(config.metadata_max_retries, 2);
        assert_eq!(config.user_id, None);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("CHARPICK_JIKAN_URL", "http://localhost:8080"),
            ("CHARPICK_DOCUMENT_STORE_URL", "http://db.local"),
            ("CHARPICK_STORAGE_PATH", "/tmp/charpick.json"),
            ("CHARPICK_REMOTE_TIMEOUT_MS", "250"),
            ("CHARPICK_METADATA_MAX_RETRIES", "0"),
            ("CHARPICK_USER_ID", " alice "),
        ]);
        assert_eq!(config.jikan_url, "http://localhost:8080");
        assert_eq!(config.document_store_url.as_deref(), Some("http://db.local"));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/charpick.json"));
        assert_eq!(config.remote_timeout, Duration::from_millis(250));
        assert_eq!(config.metadata_max_retries, 0);
        assert_eq!(config.user_id.as_ref().map(UserId::as_str), Some("alice"));
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let config = config_from(&[
            ("CHARPICK_DOCUMENT_STORE_URL", "   "),
            ("CHARPICK_REMOTE_TIMEOUT_MS", "soon"),
            ("CHARPICK_USER_ID", ""),
        ]);
        assert_eq!(config.document_store_url, None);
        assert_eq!(config.remote_timeout, Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS));
        assert_eq!(config.user_id, None);
    }
}
