//! Domain types for character selection.
//!
//! Pure data and pure functions: no I/O, no async. The engine crate owns
//! every side effect.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod queries;
pub mod value_objects;

pub use aggregates::{AnimeCache, SelectionState, StateChange};
pub use entities::{
    is_resolved_title, AnimeCacheEntry, AnimeMetadata, CharacterRef, DetailedCharacterRef,
    RosterMember, SelectionSet, MAIN_ROLE, UNRESOLVED_ANIME_TITLE,
};
pub use error::DomainError;
pub use ids::{AnimeId, CharacterId, UserId};
pub use queries::AnimeSelection;
pub use value_objects::{
    SelectionDocument, CACHED_ANIMES_DATA_FIELD, SELECTED_CHARACTER_IDS_FIELD,
};
