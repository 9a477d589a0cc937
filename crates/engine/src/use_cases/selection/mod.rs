//! Selection use cases.
//!
//! [`SelectionEngine`] is the single entry point callers use:
//! - derived queries over the current selection and roster cache
//! - selection mutations (add, remove, toggle a whole anime, clear)
//! - roster resolution against the metadata source
//! - identity-driven loading, via [`SelectionEngine::run`] or
//!   [`SelectionEngine::handle_auth_state`]

mod persistence;
mod roster;
mod store;
mod sync;


use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use charpick_domain::{
    queries, AnimeCacheEntry, AnimeId, AnimeSelection, CharacterId, DetailedCharacterRef,
    SelectionState,
};

use crate::infrastructure::ports::{
    AuthState, DocumentStore, DurableStore, IdentityProvider, MetadataSource,
};

use persistence::SelectionPersistence;
use roster::RosterCache;
use store::SelectionStore;
use sync::SelectionSync;

pub use store::SessionPhase;

/// External collaborators the engine is built from.
#[derive(Clone)]
pub struct SelectionPorts {
    pub identity: Arc<dyn IdentityProvider>,
    pub metadata: Arc<dyn MetadataSource>,
    pub documents: Arc<dyn DocumentStore>,
    pub durable: Arc<dyn DurableStore>,
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Bound on each metadata and document store call.
    pub remote_timeout: Duration,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
        }
    }
}

pub struct SelectionEngine {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<SelectionStore>,
    roster: RosterCache,
    sync: SelectionSync,
}

impl SelectionEngine {
    pub fn new(ports: SelectionPorts, config: SelectionConfig) -> Self {
        let persistence =
            SelectionPersistence::new(ports.durable, ports.documents, config.remote_timeout);
        let store = Arc::new(SelectionStore::new(persistence));

        Self {
            identity: ports.identity,
            roster: RosterCache::new(store.clone(), ports.metadata, config.remote_timeout),
            sync: SelectionSync::new(store.clone()),
            store,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn phase(&self) -> SessionPhase {
        self.store.phase()
    }

    pub fn is_character_selected(&self, id: CharacterId) -> bool {
        self.store.read(|s| queries::is_character_selected(s, id))
    }

    /// False until the current identity's state has loaded, and false for
    /// any anime without a cached roster even if its characters are selected.
    pub fn is_anime_selected(&self, anime_id: AnimeId) -> bool {
        !self.is_loading() && self.store.read(|s| queries::is_anime_selected(s, anime_id))
    }

    pub fn anime_selection(&self, anime_id: AnimeId) -> AnimeSelection {
        if self.is_loading() {
            return AnimeSelection::Unknown;
        }
        self.store.read(|s| queries::anime_selection(s, anime_id))
    }

    /// Cached animes with at least one selected character, sorted by title.
    pub fn selected_animes(&self, title_filter: Option<&str>) -> Vec<AnimeCacheEntry> {
        self.store
            .read(|s| queries::selected_animes(s, title_filter))
    }

    pub fn game_pool(&self) -> Vec<DetailedCharacterRef> {
        self.store.read(queries::game_pool)
    }

    pub fn snapshot(&self) -> SelectionState {
        self.store.snapshot()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn add_character(&self, character: &DetailedCharacterRef) {
        let id = character.id;
        self.store.commit(|s| s.select(id)).await;
    }

    pub async fn remove_character(&self, id: CharacterId) {
        self.store.commit(|s| s.deselect(id)).await;
    }

    pub async fn toggle_all_characters_of_anime(
        &self,
        anime_id: AnimeId,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) {
        self.roster.toggle_all(anime_id, title_hint, image_hint).await;
    }

    pub async fn resolve_anime_roster(
        &self,
        anime_id: AnimeId,
        title_hint: Option<&str>,
        image_hint: Option<&str>,
    ) -> Vec<DetailedCharacterRef> {
        self.roster.resolve(anime_id, title_hint, image_hint).await
    }

    /// Drop every selection and every cached anime.
    pub async fn clear_all_selections(&self) {
        self.store.commit(|s| s.clear()).await;
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub async fn handle_auth_state(&self, auth: AuthState) {
        self.sync.handle_auth_state(auth).await;
    }

    /// Wait for background writes (remote saves, load mirrors) to finish.
    pub async fn flush_pending_writes(&self) {
        self.store.persistence().flush().await;
    }

    /// Reload for whatever the identity provider reports right now.
    pub async fn refresh(&self) {
        let auth = AuthState::from_provider(self.identity.as_ref());
        self.handle_auth_state(auth).await;
    }

    /// Follow identity changes until the provider goes away.
    ///
    /// A change arriving mid-load cancels that load and starts the new one.
    pub async fn run(&self) {
        let mut changes = self.identity.subscribe();
        loop {
            let auth = changes.borrow_and_update().clone();
            tokio::select! {
                () = self.sync.handle_auth_state(auth) => {}
                Ok(()) = changes.changed() => {
                    tracing::debug!("Identity changed during load, superseding");
                    continue;
                }
            }
            if changes.changed().await.is_err() {
                tracing::debug!("Identity provider closed, stopping selection sync");
                break;
            }
        }
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run().await })
    }
}
