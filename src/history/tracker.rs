//! Tracking of the record that currently drives the display.

use crate::models::RecordId;

/// Remembers which single record is focused for display.
///
/// The focus must always point at a record present in the cache. The cache
/// keeps that true by calling [`clear`](ActiveRecordTracker::clear) when the
/// focused record is removed and [`reassign`](ActiveRecordTracker::reassign)
/// when a promotion changes its identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveRecordTracker {
    focused: Option<RecordId>,
}

impl ActiveRecordTracker {
    /// Creates a tracker with no focus.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently focused identifier, if any.
    pub fn focused(&self) -> Option<RecordId> {
        self.focused
    }

    /// True if `id` is the focused record.
    pub fn is_focused(&self, id: RecordId) -> bool {
        self.focused == Some(id)
    }

    /// Focuses `id`.
    pub fn focus(&mut self, id: RecordId) {
        self.focused = Some(id);
    }

    /// Drops the focus.
    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Follows an identity change: if `from` is focused, the focus moves to
    /// `to`. Keeps the focus alive across placeholder promotion.
    pub fn reassign(&mut self, from: RecordId, to: RecordId) {
        if self.focused == Some(from) {
            self.focused = Some(to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_and_clear() {
        let mut tracker = ActiveRecordTracker::new();
        assert_eq!(tracker.focused(), None);
        tracker.focus(RecordId::Durable(5));
        assert!(tracker.is_focused(RecordId::Durable(5)));
        tracker.clear();
        assert_eq!(tracker.focused(), None);
    }

    #[test]
    fn reassign_moves_the_focus_with_the_record() {
        let mut tracker = ActiveRecordTracker::new();
        tracker.focus(RecordId::Placeholder(1));
        tracker.reassign(RecordId::Placeholder(1), RecordId::Durable(40));
        assert!(tracker.is_focused(RecordId::Durable(40)));
    }

    #[test]
    fn reassign_ignores_unfocused_ids() {
        let mut tracker = ActiveRecordTracker::new();
        tracker.focus(RecordId::Durable(2));
        tracker.reassign(RecordId::Placeholder(1), RecordId::Durable(40));
        assert!(tracker.is_focused(RecordId::Durable(2)));
    }
}
