//! External collaborator ports: identity, anime metadata, remote documents,
//! local durable storage.

use async_trait::async_trait;
use tokio::sync::watch;

use charpick_domain::{AnimeId, AnimeMetadata, RosterMember, SelectionDocument, UserId};

use super::error::{DocumentStoreError, DurableStoreError, MetadataFetchError};

// =============================================================================
// Identity
// =============================================================================

/// Authentication state as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not finished restoring its session yet.
    Initializing,
    SignedOut,
    SignedIn(UserId),
}

impl AuthState {
    /// Rebuild the state from the provider's point-in-time accessors.
    pub fn from_provider(provider: &dyn IdentityProvider) -> Self {
        if provider.is_initializing() {
            return Self::Initializing;
        }
        match provider.current_user() {
            Some(user) => Self::SignedIn(user),
            None => Self::SignedOut,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;

    fn is_initializing(&self) -> bool;

    /// Change notifications. The receiver starts at the current state.
    fn subscribe(&self) -> watch::Receiver<AuthState>;
}

// =============================================================================
// Anime metadata
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn get_anime_by_id(&self, id: AnimeId) -> Result<AnimeMetadata, MetadataFetchError>;

    /// Full roster, every role included. Filtering is the cache's job.
    async fn get_anime_roster(&self, id: AnimeId)
        -> Result<Vec<RosterMember>, MetadataFetchError>;
}

// =============================================================================
// Remote per-user document
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when the user has no document yet.
    async fn get_document(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SelectionDocument>, DocumentStoreError>;

    /// Merge the present fields into the user's document, creating it if
    /// needed. Fields not present in `fields`, and fields this engine does
    /// not know about, are left untouched.
    async fn upsert_document(
        &self,
        user_id: &UserId,
        fields: SelectionDocument,
    ) -> Result<(), DocumentStoreError>;
}

// =============================================================================
// Local durable storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DurableStoreError>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DurableStoreError>;
}

/// Durable store keys.
///
/// Versioned so a schema change never reads data written by an older install.
pub mod storage_keys {
    pub const SELECTED_CHARACTER_IDS: &str = "charpick.selected_character_ids.v3";
    pub const CACHED_ANIMES_DATA: &str = "charpick.cached_animes_data.v3";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializing_wins_over_any_cached_user() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_is_initializing().return_const(true);
        provider
            .expect_current_user()
            .returning(|| UserId::new("u1").ok());

        assert_eq!(AuthState::from_provider(&provider), AuthState::Initializing);
    }

    #[test]
    fn resolved_provider_maps_user_presence() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_is_initializing().return_const(false);
        provider.expect_current_user().return_const(None);
        assert_eq!(AuthState::from_provider(&provider), AuthState::SignedOut);

        let user = UserId::new("u1").expect("valid user id");
        let mut provider = MockIdentityProvider::new();
        provider.expect_is_initializing().return_const(false);
        provider.expect_current_user().return_const(Some(user.clone()));
        assert_eq!(AuthState::from_provider(&provider), AuthState::SignedIn(user));
    }
}
