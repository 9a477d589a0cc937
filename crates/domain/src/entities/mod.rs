//! Domain entities.

pub mod anime;
pub mod character;
pub mod selection;

pub use anime::{is_resolved_title, AnimeCacheEntry, AnimeMetadata, UNRESOLVED_ANIME_TITLE};
pub use character::{CharacterRef, DetailedCharacterRef, RosterMember, MAIN_ROLE};
pub use selection::SelectionSet;
