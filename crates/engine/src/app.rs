//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    document_store::{HttpDocumentStore, InMemoryDocumentStore},
    identity::WatchIdentityProvider,
    jikan::JikanClient,
    local_store::FileDurableStore,
    ports::DocumentStore,
    resilient_metadata::{ResilientMetadataSource, RetryConfig},
    settings::EngineConfig,
};
use crate::use_cases::{SelectionConfig, SelectionEngine, SelectionPorts};

/// Main application state.
///
/// Owns the identity provider so the host can drive sign-in and sign-out,
/// and the selection engine built on the configured adapters.
pub struct App {
    pub identity: Arc<WatchIdentityProvider>,
    pub selection: Arc<SelectionEngine>,
}

impl App {
    pub fn new(identity: Arc<WatchIdentityProvider>, selection: Arc<SelectionEngine>) -> Self {
        Self {
            identity,
            selection,
        }
    }

    /// Wire the production adapters from `config`.
    ///
    /// Identity starts from `config.user_id`: signed in when set, signed out
    /// otherwise.
    pub async fn from_config(config: &EngineConfig) -> Self {
        let jikan = Arc::new(JikanClient::with_timeout(&config.jikan_url, config.remote_timeout));
        let retry_config = RetryConfig {
            max_retries: config.metadata_max_retries,
            ..RetryConfig::default()
        };
        tracing::info!(
            url = %config.jikan_url,
            max_retries = retry_config.max_retries,
            base_delay_ms = retry_config.base_delay_ms,
            "Metadata client configured"
        );
        let metadata = Arc::new(ResilientMetadataSource::new(jikan, retry_config));

        let documents: Arc<dyn DocumentStore> = match &config.document_store_url {
            Some(url) => {
                tracing::info!(%url, "Using remote document store");
                let store = HttpDocumentStore::new(url, config.remote_timeout);
                match &config.document_store_token {
                    Some(token) => Arc::new(store.with_auth_token(token)),
                    None => Arc::new(store),
                }
            }
            None => {
                tracing::info!("No document store configured, keeping documents in memory");
                Arc::new(InMemoryDocumentStore::new())
            }
        };

        let durable = Arc::new(FileDurableStore::open(&config.storage_path).await);

        let identity = Arc::new(WatchIdentityProvider::new());
        match &config.user_id {
            Some(user) => identity.sign_in(user.clone()),
            None => identity.sign_out(),
        }

        let selection = Arc::new(SelectionEngine::new(
            SelectionPorts {
                identity: identity.clone(),
                metadata,
                documents,
                durable,
            },
            SelectionConfig {
                remote_timeout: config.remote_timeout,
            },
        ));

        Self::new(identity, selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::selection::SessionPhase;
    use charpick_domain::{AnimeId, CharacterId, DetailedCharacterRef, UserId};

    fn config(dir: &tempfile::TempDir, user: Option<&str>) -> EngineConfig {
        EngineConfig {
            storage_path: dir.path().join("storage.json"),
            user_id: user.map(|u| UserId::new(u).expect("valid user id")),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn guest_selection_survives_restart() {
        let dir = tempfile::tempdir().expect("tempdir");

        let app = App::from_config(&config(&dir, None)).await;
        app.selection.refresh().await;
        assert_eq!(app.selection.phase(), SessionPhase::Anonymous);
        app.selection
            .add_character(&DetailedCharacterRef {
                id: CharacterId::new(1),
                name: "Vash".to_string(),
                image_url: None,
                anime_id: AnimeId::new(42),
                anime_title: "Trigun".to_string(),
            })
            .await;
        drop(app);

        let app = App::from_config(&config(&dir, None)).await;
        app.selection.refresh().await;
        assert!(app.selection.is_character_selected(CharacterId::new(1)));
    }

    #[tokio::test]
    async fn configured_user_signs_in() {
        let dir = tempfile::tempdir().expect("tempdir");

        let app = App::from_config(&config(&dir, Some("alice"))).await;
        app.selection.refresh().await;

        assert!(!app.selection.is_loading());
        assert_eq!(
            app.selection.phase(),
            SessionPhase::Identified(UserId::new("alice").expect("valid user id"))
        );
    }
}
