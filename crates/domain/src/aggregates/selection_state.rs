//! SelectionState aggregate - the selection set plus the anime roster cache.

use std::collections::BTreeMap;

use crate::entities::{AnimeCacheEntry, SelectionSet};
use crate::ids::{AnimeId, CharacterId};

/// Cached anime entries keyed by anime id.
pub type AnimeCache = BTreeMap<AnimeId, AnimeCacheEntry>;

/// Which top-level fields a mutation touched.
///
/// Persistence writes each field independently, so mutations report them
/// separately instead of a single dirty flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct StateChange {
    pub selection: bool,
    pub cache: bool,
}

impl StateChange {
    pub const NONE: Self = Self {
        selection: false,
        cache: false,
    };

    pub fn selection(changed: bool) -> Self {
        Self {
            selection: changed,
            cache: false,
        }
    }

    pub fn cache(changed: bool) -> Self {
        Self {
            selection: false,
            cache: changed,
        }
    }

    pub fn any(self) -> bool {
        self.selection || self.cache
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            selection: self.selection || other.selection,
            cache: self.cache || other.cache,
        }
    }
}

/// Root aggregate owned by the synchronizer for the active identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selection: SelectionSet,
    cache: AnimeCache,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(selection: SelectionSet, cache: AnimeCache) -> Self {
        Self { selection, cache }
    }

    pub fn into_parts(self) -> (SelectionSet, AnimeCache) {
        (self.selection, self.cache)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn cache(&self) -> &AnimeCache {
        &self.cache
    }

    pub fn entry(&self, anime_id: AnimeId) -> Option<&AnimeCacheEntry> {
        self.cache.get(&anime_id)
    }

    /// Nothing selected and nothing cached.
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty() && self.cache.is_empty()
    }

    // -------------------------------------------------------------------------
    // Selection mutations
    // -------------------------------------------------------------------------

    pub fn select(&mut self, id: CharacterId) -> StateChange {
        StateChange::selection(self.selection.insert(id))
    }

    pub fn deselect(&mut self, id: CharacterId) -> StateChange {
        StateChange::selection(self.selection.remove(id))
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = CharacterId>) -> StateChange {
        StateChange::selection(self.selection.insert_all(ids))
    }

    pub fn deselect_all(&mut self, ids: impl IntoIterator<Item = CharacterId>) -> StateChange {
        StateChange::selection(self.selection.remove_all(ids))
    }

    // -------------------------------------------------------------------------
    // Cache mutations
    // -------------------------------------------------------------------------

    /// Insert or overwrite the entry for `entry.id`.
    pub fn store_entry(&mut self, entry: AnimeCacheEntry) -> StateChange {
        if self.cache.get(&entry.id) == Some(&entry) {
            return StateChange::NONE;
        }
        self.cache.insert(entry.id, entry);
        StateChange::cache(true)
    }

    /// Replace title and image of an existing entry, leaving its roster alone.
    pub fn update_metadata(
        &mut self,
        anime_id: AnimeId,
        title: &str,
        image_url: &str,
    ) -> StateChange {
        let Some(entry) = self.cache.get_mut(&anime_id) else {
            return StateChange::NONE;
        };
        if entry.title == title && entry.image_url == image_url {
            return StateChange::NONE;
        }
        entry.title = title.to_string();
        entry.image_url = image_url.to_string();
        StateChange::cache(true)
    }

    /// Drop every selection and every cached anime.
    pub fn clear(&mut self) -> StateChange {
        let selection = self.selection.clear();
        let cache = !self.cache.is_empty();
        self.cache.clear();
        StateChange { selection, cache }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CharacterRef;

    fn entry(id: i64, title: &str, roster: &[i64]) -> AnimeCacheEntry {
        AnimeCacheEntry::new(
            AnimeId::new(id),
            title,
            "",
            roster
                .iter()
                .map(|c| CharacterRef::new(CharacterId::new(*c), format!("c{c}")))
                .collect(),
        )
    }

    #[test]
    fn selection_mutations_report_selection_field_only() {
        let mut state = SelectionState::new();
        assert_eq!(state.select(CharacterId::new(1)), StateChange::selection(true));
        assert_eq!(state.select(CharacterId::new(1)), StateChange::NONE);
        assert_eq!(state.deselect(CharacterId::new(1)), StateChange::selection(true));
        assert!(!state.deselect(CharacterId::new(1)).any());
    }

    #[test]
    fn storing_identical_entry_is_not_a_change() {
        let mut state = SelectionState::new();
        assert_eq!(state.store_entry(entry(42, "X", &[1])), StateChange::cache(true));
        assert_eq!(state.store_entry(entry(42, "X", &[1])), StateChange::NONE);
        assert_eq!(state.store_entry(entry(42, "X", &[1, 2])), StateChange::cache(true));
    }

    #[test]
    fn update_metadata_keeps_roster() {
        let mut state = SelectionState::new();
        let _ = state.store_entry(entry(42, "Anime", &[1, 2]));

        let change = state.update_metadata(AnimeId::new(42), "Real Title", "img");
        assert!(change.cache);

        let stored = state.entry(AnimeId::new(42)).expect("entry");
        assert_eq!(stored.title, "Real Title");
        assert_eq!(stored.image_url, "img");
        assert_eq!(stored.roster.len(), 2);

        assert!(!state.update_metadata(AnimeId::new(7), "t", "i").any());
    }

    #[test]
    fn clear_reports_both_fields() {
        let mut state = SelectionState::new();
        let _ = state.select(CharacterId::new(1));
        let _ = state.store_entry(entry(42, "X", &[1]));

        assert_eq!(
            state.clear(),
            StateChange {
                selection: true,
                cache: true
            }
        );
        assert!(state.is_empty());
        assert_eq!(state.clear(), StateChange::NONE);
    }
}
