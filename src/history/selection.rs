//! The selection set: records marked for bulk deletion.

use std::collections::HashSet;

use log::debug;

use crate::models::RecordId;

/// Identifiers marked for bulk deletion.
///
/// Only durable identifiers may enter. A placeholder has no store-side row
/// yet, so selecting one could only produce a delete request the store
/// cannot honor; the boundary treats such attempts as no-ops rather than
/// errors, matching how a checkbox on a still-saving row should behave.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<RecordId>,
}

impl SelectionSet {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selected records.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True if `id` is currently selected.
    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    /// Toggles membership for `id`; returns whether it is selected afterwards.
    ///
    /// Placeholder identifiers are rejected silently.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if id.is_placeholder() {
            debug!("ignoring selection toggle for unsaved record {id}");
            return false;
        }
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Adds `id` to the selection; returns false for placeholders.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if id.is_placeholder() {
            debug!("ignoring selection insert for unsaved record {id}");
            return false;
        }
        self.ids.insert(id);
        true
    }

    /// Removes `id` from the selection if present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        self.ids.remove(&id)
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops every selected id that is not in `present`.
    ///
    /// Called after removals and resyncs so the selection never references
    /// a record that has left the cache.
    pub fn retain_present(&mut self, present: &HashSet<RecordId>) {
        self.ids.retain(|id| present.contains(id));
    }

    /// Selected identifiers in a stable, sorted order.
    pub fn ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(RecordId::Durable(1)));
        assert!(selection.contains(RecordId::Durable(1)));
        assert!(!selection.toggle(RecordId::Durable(1)));
        assert!(selection.is_empty());
    }

    #[test]
    fn placeholders_never_enter() {
        let mut selection = SelectionSet::new();
        assert!(!selection.toggle(RecordId::Placeholder(1)));
        assert!(!selection.insert(RecordId::Placeholder(2)));
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_present_prunes_departed_ids() {
        let mut selection = SelectionSet::new();
        selection.insert(RecordId::Durable(1));
        selection.insert(RecordId::Durable(2));
        selection.insert(RecordId::Durable(3));

        let present: HashSet<RecordId> =
            [RecordId::Durable(2)].into_iter().collect();
        selection.retain_present(&present);

        assert_eq!(selection.ids(), vec![RecordId::Durable(2)]);
    }

    #[test]
    fn ids_are_sorted() {
        let mut selection = SelectionSet::new();
        selection.insert(RecordId::Durable(9));
        selection.insert(RecordId::Durable(2));
        selection.insert(RecordId::Durable(5));
        assert_eq!(
            selection.ids(),
            vec![
                RecordId::Durable(2),
                RecordId::Durable(5),
                RecordId::Durable(9)
            ]
        );
    }
}
