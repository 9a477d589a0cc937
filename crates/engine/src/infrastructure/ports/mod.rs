//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Identity (could swap the watch-channel provider for a real auth SDK)
//! - Anime metadata (could swap Jikan for another catalogue)
//! - Remote per-user documents (HTTP or in-memory)
//! - Local durable storage (file or in-memory)

mod error;
mod external;

pub use external::{
    storage_keys, AuthState, DocumentStore, DurableStore, IdentityProvider, MetadataSource,
};

#[cfg(test)]
pub use external::{MockDocumentStore, MockDurableStore, MockIdentityProvider, MockMetadataSource};

pub use error::{DocumentStoreError, DurableStoreError, MetadataFetchError};
