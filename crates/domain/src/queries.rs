//! Derived, side-effect free views over a [`SelectionState`].
//!
//! These never consult the network and never mutate; the engine layers its
//! "still loading" gate on top.

use std::collections::HashSet;

use crate::aggregates::SelectionState;
use crate::entities::{AnimeCacheEntry, DetailedCharacterRef};
use crate::ids::{AnimeId, CharacterId};

/// How much of one anime's cached roster is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeSelection {
    /// No roster is cached (or state is still loading); nothing can be said.
    Unknown,
    None,
    Partial { selected: usize, total: usize },
    Full,
}

impl AnimeSelection {
    /// Partial selection counts as selected.
    pub fn is_selected(self) -> bool {
        matches!(self, Self::Partial { .. } | Self::Full)
    }
}

pub fn is_character_selected(state: &SelectionState, id: CharacterId) -> bool {
    state.selection().contains(id)
}

/// True iff a roster is cached for `anime_id` and any of its characters is selected.
///
/// Selected characters of an anime with no cached roster do not count.
pub fn is_anime_selected(state: &SelectionState, anime_id: AnimeId) -> bool {
    state
        .entry(anime_id)
        .is_some_and(|entry| entry.roster_ids().any(|id| state.selection().contains(id)))
}

pub fn anime_selection(state: &SelectionState, anime_id: AnimeId) -> AnimeSelection {
    let Some(entry) = state.entry(anime_id).filter(|e| e.has_roster()) else {
        return AnimeSelection::Unknown;
    };
    let total = entry.roster.len();
    let selected = entry
        .roster_ids()
        .filter(|id| state.selection().contains(*id))
        .count();

    match selected {
        0 => AnimeSelection::None,
        n if n == total => AnimeSelection::Full,
        n => AnimeSelection::Partial { selected: n, total },
    }
}

/// Cached animes that count as selected, ordered by title.
///
/// `title_filter` is matched case-insensitively as a substring; blank filters
/// match everything.
pub fn selected_animes(state: &SelectionState, title_filter: Option<&str>) -> Vec<AnimeCacheEntry> {
    let needle = title_filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let mut animes: Vec<AnimeCacheEntry> = state
        .cache()
        .values()
        .filter(|entry| is_anime_selected(state, entry.id))
        .filter(|entry| match &needle {
            Some(n) => entry.title.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    animes.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    animes
}

/// Every selected character that appears in some cached roster, joined with
/// its anime title.
///
/// A character listed under several animes appears once, under the first
/// anime by id.
pub fn game_pool(state: &SelectionState) -> Vec<DetailedCharacterRef> {
    let mut seen = HashSet::new();
    let mut pool = Vec::new();
    for entry in state.cache().values() {
        for character in &entry.roster {
            if state.selection().contains(character.id) && seen.insert(character.id) {
                pool.push(character.detailed(entry.id, &entry.title));
            }
        }
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::AnimeCache;
    use crate::entities::{CharacterRef, SelectionSet};

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

    fn state(selected: &[i64], entries: Vec<AnimeCacheEntry>) -> SelectionState {
        let selection: SelectionSet = selected.iter().map(|id| CharacterId::new(*id)).collect();
        let cache: AnimeCache = entries.into_iter().map(|e| (e.id, e)).collect();
        SelectionState::from_parts(selection, cache)
    }

    #[test]
    fn anime_without_cached_roster_is_not_selected() {
        let state = state(&[1], vec![]);
        assert!(is_character_selected(&state, CharacterId::new(1)));
        assert!(!is_anime_selected(&state, AnimeId::new(42)));
        assert_eq!(anime_selection(&state, AnimeId::new(42)), AnimeSelection::Unknown);
    }

    #[test]
    fn partial_selection_counts_as_selected() {
        let state = state(&[2], vec![entry(42, "X", &[1, 2, 3])]);
        assert!(is_anime_selected(&state, AnimeId::new(42)));
        assert_eq!(
            anime_selection(&state, AnimeId::new(42)),
            AnimeSelection::Partial {
                selected: 1,
                total: 3
            }
        );
    }

    #[test]
    fn full_and_empty_selection_are_distinguished() {
        let full = state(&[1, 2], vec![entry(42, "X", &[1, 2])]);
        assert_eq!(anime_selection(&full, AnimeId::new(42)), AnimeSelection::Full);

        let none = state(&[], vec![entry(42, "X", &[1, 2])]);
        assert_eq!(anime_selection(&none, AnimeId::new(42)), AnimeSelection::None);
        assert!(!AnimeSelection::None.is_selected());
    }

    #[test]
    fn selected_animes_sorted_by_title_and_filtered() {
        let state = state(
            &[1, 5, 9],
            vec![
                entry(3, "Naruto", &[1]),
                entry(4, "Bleach", &[5]),
                entry(5, "One Piece", &[7]),
                entry(6, "Monster", &[9]),
            ],
        );

        let titles: Vec<String> = selected_animes(&state, None)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Bleach", "Monster", "Naruto"]);

        let filtered = selected_animes(&state, Some("  NAR "));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, AnimeId::new(3));

        assert_eq!(selected_animes(&state, Some("   ")).len(), 3);
    }

    #[test]
    fn game_pool_deduplicates_across_rosters() {
        let state = state(
            &[1, 2],
            vec![entry(10, "A", &[1, 2, 3]), entry(11, "B", &[2, 4])],
        );

        let pool = game_pool(&state);
        let ids: Vec<i64> = pool.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(pool.iter().all(|c| c.anime_title == "A"));
    }
}
