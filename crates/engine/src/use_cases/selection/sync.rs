//! Selection synchronizer: reloads state whenever identity changes.

use std::sync::Arc;

use charpick_domain::{SelectionState, UserId};

use super::store::{LoadCommit, SelectionStore, SessionPhase};
use crate::infrastructure::ports::AuthState;

pub(crate) struct SelectionSync {
    store: Arc<SelectionStore>,
}

impl SelectionSync {
    pub fn new(store: Arc<SelectionStore>) -> Self {
        Self { store }
    }

    pub async fn handle_auth_state(&self, auth: AuthState) {
        match auth {
            AuthState::Initializing => {
                tracing::debug!("Identity unresolved, holding persistence");
                self.store.enter_unresolved();
            }
            AuthState::SignedOut => self.load_anonymous().await,
            AuthState::SignedIn(user) => self.load_identified(user).await,
        }
    }

    async fn load_anonymous(&self) {
        let generation = self.store.begin_load(SessionPhase::Anonymous);
        let state = self.store.persistence().load_local().await;
        tracing::info!(
            selected = state.selection().len(),
            cached_animes = state.cache().len(),
            "Loaded guest selection"
        );
        self.apply(generation, state, false);
    }

    async fn load_identified(&self, user: UserId) {
        let generation = self.store.begin_load(SessionPhase::Identified(user.clone()));
        let persistence = self.store.persistence();

        match persistence.fetch_document(&user).await {
            Ok(Some(document)) => {
                let state = document.into_state();
                tracing::info!(
                    user_id = %user,
                    selected = state.selection().len(),
                    cached_animes = state.cache().len(),
                    "Loaded remote selection"
                );
                self.apply(generation, state, true);
            }
            Ok(None) => {
                let state = persistence.load_local().await;
                if state.is_empty() {
                    tracing::debug!(user_id = %user, "No remote document and no guest data");
                } else if let Err(e) = persistence.migrate_guest(&user, &state).await {
                    tracing::warn!(user_id = %user, error = %e, "Failed to migrate guest selection");
                } else {
                    tracing::info!(
                        user_id = %user,
                        selected = state.selection().len(),
                        "Migrated guest selection to new remote document"
                    );
                }
                self.apply(generation, state, false);
            }
            Err(e) => {
                tracing::warn!(user_id = %user, error = %e, "Failed to load remote selection, using local");
                let state = persistence.load_local().await;
                self.apply(generation, state, false);
            }
        }
    }

    /// Commits a finished load. The local mirror is written detached, so
    /// cancelling the caller cannot leave it half done.
    fn apply(&self, generation: u64, state: SelectionState, mirror_local: bool) {
        match self.store.finish_load(generation, state, mirror_local) {
            LoadCommit::Stale => {
                tracing::debug!(generation, "Discarding superseded load");
            }
            LoadCommit::Applied(Some(mirror)) => self.store.persistence().save_detached(mirror),
            LoadCommit::Applied(None) => {}
        }
    }
}
