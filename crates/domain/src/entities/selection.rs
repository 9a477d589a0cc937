//! The global set of selected characters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::CharacterId;

/// Character ids the user picked, regardless of which anime they came from.
///
/// Serialized as a sorted array so persisted documents are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CharacterId>", into = "Vec<CharacterId>")]
pub struct SelectionSet {
    ids: HashSet<CharacterId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns `true` if the id was not selected before.
    pub fn insert(&mut self, id: CharacterId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the id was selected before.
    pub fn remove(&mut self, id: CharacterId) -> bool {
        self.ids.remove(&id)
    }

    /// Returns `true` if at least one id was newly selected.
    pub fn insert_all(&mut self, ids: impl IntoIterator<Item = CharacterId>) -> bool {
        ids.into_iter().fold(false, |changed, id| self.insert(id) || changed)
    }

    /// Returns `true` if at least one id was deselected.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = CharacterId>) -> bool {
        ids.into_iter().fold(false, |changed, id| self.remove(id) || changed)
    }

    /// Returns `true` if the set was non-empty.
    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_sorted_vec(&self) -> Vec<CharacterId> {
        let mut ids: Vec<CharacterId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl From<Vec<CharacterId>> for SelectionSet {
    fn from(ids: Vec<CharacterId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<SelectionSet> for Vec<CharacterId> {
    fn from(set: SelectionSet) -> Self {
        set.to_sorted_vec()
    }
}

impl FromIterator<CharacterId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = CharacterId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: i64) -> CharacterId {
        CharacterId::new(raw)
    }

    #[test]
    fn insert_and_remove_are_idempotent() {
        let mut set = SelectionSet::new();
        assert!(set.insert(id(1)));
        assert!(!set.insert(id(1)));
        assert_eq!(set.len(), 1);

        assert!(set.remove(id(1)));
        assert!(!set.remove(id(1)));
        assert!(set.is_empty());
    }

    #[test]
    fn bulk_operations_report_changes() {
        let mut set: SelectionSet = vec![id(1)].into();
        assert!(set.insert_all([id(1), id(2)]));
        assert!(!set.insert_all([id(1), id(2)]));
        assert!(set.remove_all([id(2), id(3)]));
        assert!(!set.remove_all([id(3)]));
        assert_eq!(set.to_sorted_vec(), vec![id(1)]);
    }

    #[test]
    fn serializes_as_sorted_array() {
        let set: SelectionSet = vec![id(9), id(3), id(3)].into();
        assert_eq!(serde_json::to_string(&set).expect("serialize"), "[3,9]");

        let parsed: SelectionSet = serde_json::from_str("[5,1]").expect("deserialize");
        assert!(parsed.contains(id(5)));
        assert!(parsed.contains(id(1)));
    }

    #[test]
    fn clear_reports_whether_anything_was_selected() {
        let mut set = SelectionSet::new();
        assert!(!set.clear());
        set.insert(id(4));
        assert!(set.clear());
        assert!(set.is_empty());
    }
}
