//! Persisted shape of a user's selection.
//!
//! The same layout is used for the remote per-user document and for the two
//! local durable keys:
//!
//! ```text
//! { "selectedCharacterIds": [1, 2], "cachedAnimesData": { "42": { "mal_id": 42, ... } } }
//! ```
//!
//! Both fields are optional so the struct doubles as a partial update.

use serde::{Deserialize, Serialize};

use crate::aggregates::{AnimeCache, SelectionState};
use crate::entities::SelectionSet;

pub const SELECTED_CHARACTER_IDS_FIELD: &str = "selectedCharacterIds";
pub const CACHED_ANIMES_DATA_FIELD: &str = "cachedAnimesData";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_character_ids: Option<SelectionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_animes_data: Option<AnimeCache>,
}

impl SelectionDocument {
    /// Both fields, taken from `state`.
    pub fn full(state: &SelectionState) -> Self {
        Self {
            selected_character_ids: Some(state.selection().clone()),
            cached_animes_data: Some(state.cache().clone()),
        }
    }

    pub fn selection_only(selection: SelectionSet) -> Self {
        Self {
            selected_character_ids: Some(selection),
            cached_animes_data: None,
        }
    }

    pub fn cache_only(cache: AnimeCache) -> Self {
        Self {
            selected_character_ids: None,
            cached_animes_data: Some(cache),
        }
    }

    /// Whether this carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.selected_character_ids.is_none() && self.cached_animes_data.is_none()
    }

    /// Missing fields become empty defaults.
    pub fn into_state(self) -> SelectionState {
        SelectionState::from_parts(
            self.selected_character_ids.unwrap_or_default(),
            self.cached_animes_data.unwrap_or_default(),
        )
    }
}
