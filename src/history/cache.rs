//! The optimistic history cache.
//!
//! An ordered, IP-keyed collection of lookup records that mutates
//! synchronously, before any network round-trip:
//!
//! - a lookup result is upserted immediately, minting a placeholder id
//!   for records the store has not confirmed yet
//! - a store confirmation later promotes the placeholder to the durable id
//! - a resync replaces the whole cache with the store's list
//!
//! The cache owns the [`SelectionSet`] and [`ActiveRecordTracker`] so that
//! every mutation keeps them consistent: removed records leave the
//! selection and drop the focus, and promotions carry the focus over to
//! the new identifier.

use std::collections::HashSet;

use chrono::Utc;
use log::debug;

use crate::history::selection::SelectionSet;
use crate::history::tracker::ActiveRecordTracker;
use crate::models::{HistoryRecord, RecordFields, RecordId};

/// What a durable-id confirmation did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteOutcome {
    /// The placeholder was replaced by the durable identifier.
    Promoted,
    /// The record already carried this durable identifier.
    AlreadyDurable,
    /// The record holds a different durable identifier and was left alone.
    Conflict {
        /// The durable id the record kept.
        held: u64,
    },
    /// No record with the given IP is cached.
    NotFound,
}

/// Local, instantly-mutable history state.
#[derive(Debug, Default)]
pub struct HistoryCache {
    records: Vec<HistoryRecord>,
    selection: SelectionSet,
    tracker: ActiveRecordTracker,
    next_placeholder: u64,
}

impl HistoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in display order, most recent first.
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// The record for `ip`, if one is cached.
    pub fn get(&self, ip: &str) -> Option<&HistoryRecord> {
        self.records.iter().find(|record| record.ip == ip)
    }

    /// The record with identifier `id`, if one is cached.
    pub fn get_by_id(&self, id: RecordId) -> Option<&HistoryRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    fn mint_placeholder(&mut self) -> RecordId {
        self.next_placeholder += 1;
        RecordId::Placeholder(self.next_placeholder)
    }

    /// Inserts or updates the record for `fields.ip` and returns its id.
    ///
    /// An unknown IP inserts a new record at the head with a fresh
    /// placeholder id. A known IP updates the existing record in place:
    /// same position, same id, same `created_at`, new fields and
    /// `updated_at`. The cache never holds two records for one IP.
    pub fn upsert(&mut self, fields: RecordFields) -> RecordId {
        let now = Utc::now();
        if let Some(position) = self
            .records
            .iter()
            .position(|record| record.ip == fields.ip)
        {
            let record = &mut self.records[position];
            record.city = fields.city;
            record.region = fields.region;
            record.country = fields.country;
            record.loc = fields.loc;
            record.updated_at = now;
            debug!("updated cached record for {} in place", record.ip);
            record.id
        } else {
            let id = self.mint_placeholder();
            debug!("inserting {} at head with {id}", fields.ip);
            self.records.insert(
                0,
                HistoryRecord {
                    id,
                    ip: fields.ip,
                    city: fields.city,
                    region: fields.region,
                    country: fields.country,
                    loc: fields.loc,
                    created_at: now,
                    updated_at: now,
                },
            );
            id
        }
    }

    /// Applies a store confirmation to the record for `ip`.
    ///
    /// Promotion replaces a placeholder id with the durable id and moves
    /// the display focus along with it. It never rewrites an existing
    /// durable id: confirming the same id again is a no-op, and a
    /// different id is reported as a conflict and discarded.
    pub fn promote(&mut self, ip: &str, durable_id: u64) -> PromoteOutcome {
        let Some(record) = self.records.iter_mut().find(|record| record.ip == ip) else {
            return PromoteOutcome::NotFound;
        };
        match record.id {
            RecordId::Placeholder(_) => {
                let placeholder = record.id;
                record.id = RecordId::Durable(durable_id);
                self.tracker.reassign(placeholder, record.id);
                PromoteOutcome::Promoted
            }
            RecordId::Durable(held) if held == durable_id => PromoteOutcome::AlreadyDurable,
            RecordId::Durable(held) => PromoteOutcome::Conflict { held },
        }
    }

    /// Removes every record whose id appears in `ids`, returning them.
    ///
    /// Unknown ids are ignored. Removed records leave the selection, and
    /// the focus clears if its record was removed.
    pub fn remove_many(&mut self, ids: &[RecordId]) -> Vec<HistoryRecord> {
        let (removed, kept): (Vec<HistoryRecord>, Vec<HistoryRecord>) =
            std::mem::take(&mut self.records)
                .into_iter()
                .partition(|record| ids.contains(&record.id));
        self.records = kept;
        for record in &removed {
            self.selection.remove(record.id);
            if self.tracker.is_focused(record.id) {
                self.tracker.clear();
            }
        }
        removed
    }

    /// Replaces the entire cache with the store's record list.
    ///
    /// This is the resync primitive: local state is discarded wholesale in
    /// favor of server truth. Selection entries and the focus survive only
    /// if their ids still exist in the new list.
    pub fn replace_all(&mut self, records: Vec<HistoryRecord>) {
        self.records = records;
        let present: HashSet<RecordId> = self.records.iter().map(|record| record.id).collect();
        self.selection.retain_present(&present);
        if let Some(active) = self.tracker.focused() {
            if !present.contains(&active) {
                self.tracker.clear();
            }
        }
    }

    /// Toggles selection for a cached record.
    ///
    /// Absent ids and placeholders are no-ops; returns whether the id is
    /// selected afterwards.
    pub fn toggle_selection(&mut self, id: RecordId) -> bool {
        if self.get_by_id(id).is_none() {
            debug!("ignoring selection toggle for uncached id {id}");
            return false;
        }
        self.selection.toggle(id)
    }

    /// Selects every durable record. Placeholders stay unselected.
    pub fn select_all(&mut self) {
        for record in &self.records {
            if record.id.is_durable() {
                self.selection.insert(record.id);
            }
        }
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Focuses `id` for display; ids not in the cache clear the focus
    /// instead, so the focus never dangles.
    pub fn set_active(&mut self, id: RecordId) {
        if self.get_by_id(id).is_some() {
            self.tracker.focus(id);
        } else {
            debug!("refusing to focus uncached id {id}");
            self.tracker.clear();
        }
    }

    /// Drops the display focus.
    pub fn clear_active(&mut self) {
        self.tracker.clear();
    }

    /// Identifier of the focused record, if any.
    pub fn active(&self) -> Option<RecordId> {
        self.tracker.focused()
    }

    /// The focused record itself, if any.
    pub fn active_record(&self) -> Option<&HistoryRecord> {
        self.tracker.focused().and_then(|id| self.get_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;

    fn fields(ip: &str, city: &str) -> RecordFields {
        RecordFields {
            ip: ip.to_string(),
            city: city.to_string(),
            region: "Region".to_string(),
            country: "US".to_string(),
            loc: None,
        }
    }

    fn durable_record(id: u64, ip: &str, created_at: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord {
            id: RecordId::Durable(id),
            ip: ip.to_string(),
            city: "City".to_string(),
            region: "Region".to_string(),
            country: "US".to_string(),
            loc: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn seeded_cache() -> HistoryCache {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut cache = HistoryCache::new();
        cache.replace_all(vec![
            durable_record(3, "9.9.9.9", base + chrono::Duration::hours(2)),
            durable_record(2, "8.8.8.8", base + chrono::Duration::hours(1)),
            durable_record(1, "1.1.1.1", base),
        ]);
        cache
    }

    #[test]
    fn new_ip_inserts_at_head_with_placeholder() {
        let mut cache = seeded_cache();
        let id = cache.upsert(fields("203.0.113.9", "Newtown"));
        assert!(id.is_placeholder());
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.records()[0].ip, "203.0.113.9");
        assert_eq!(cache.records()[0].id, id);
    }

    #[test]
    fn repeat_ip_updates_in_place() {
        let mut cache = seeded_cache();
        let original = cache.get("8.8.8.8").unwrap().clone();

        let id = cache.upsert(fields("8.8.8.8", "Fresh City"));

        assert_eq!(id, RecordId::Durable(2));
        assert_eq!(cache.len(), 3);
        let updated = cache.get("8.8.8.8").unwrap();
        // same slot, same identity, same creation time
        assert_eq!(cache.records()[1].ip, "8.8.8.8");
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.city, "Fresh City");
        assert!(updated.updated_at > original.updated_at);
    }

    #[test]
    fn upsert_never_duplicates_an_ip() {
        let mut cache = HistoryCache::new();
        cache.upsert(fields("8.8.8.8", "First"));
        cache.upsert(fields("8.8.8.8", "Second"));
        cache.upsert(fields("8.8.8.8", "Third"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("8.8.8.8").unwrap().city, "Third");
    }

    #[test]
    fn racing_upserts_apply_last_writer_wins() {
        // Two lookups of the same IP can finish out of order; whichever
        // result lands last is the one the cache keeps.
        let mut cache = HistoryCache::new();
        let first = cache.upsert(fields("8.8.8.8", "Stale Result"));
        let second = cache.upsert(fields("8.8.8.8", "Fresh Result"));
        assert_eq!(first, second);
        assert_eq!(cache.get("8.8.8.8").unwrap().city, "Fresh Result");
    }

    #[test]
    fn placeholder_ids_are_distinct() {
        let mut cache = HistoryCache::new();
        let a = cache.upsert(fields("1.1.1.1", "A"));
        let b = cache.upsert(fields("2.2.2.2", "B"));
        assert_ne!(a, b);
    }

    #[test]
    fn promote_replaces_placeholder_and_keeps_everything_else() {
        let mut cache = seeded_cache();
        let placeholder = cache.upsert(fields("203.0.113.9", "Newtown"));
        let created_at = cache.get("203.0.113.9").unwrap().created_at;

        assert_eq!(cache.promote("203.0.113.9", 40), PromoteOutcome::Promoted);

        let record = cache.get("203.0.113.9").unwrap();
        assert_eq!(record.id, RecordId::Durable(40));
        assert_eq!(record.created_at, created_at);
        assert_eq!(cache.records()[0].ip, "203.0.113.9");
        assert!(cache.get_by_id(placeholder).is_none());
    }

    #[test]
    fn promote_is_idempotent_for_matching_durable_id() {
        let mut cache = seeded_cache();
        assert_eq!(cache.promote("8.8.8.8", 2), PromoteOutcome::AlreadyDurable);
        assert_eq!(cache.get("8.8.8.8").unwrap().id, RecordId::Durable(2));
    }

    #[test]
    fn promote_reports_conflicts_without_rewriting() {
        let mut cache = seeded_cache();
        assert_eq!(
            cache.promote("8.8.8.8", 99),
            PromoteOutcome::Conflict { held: 2 }
        );
        // the held id wins
        assert_eq!(cache.get("8.8.8.8").unwrap().id, RecordId::Durable(2));
    }

    #[test]
    fn promote_reports_missing_records() {
        let mut cache = seeded_cache();
        assert_eq!(cache.promote("198.51.100.1", 7), PromoteOutcome::NotFound);
    }

    #[test]
    fn promote_carries_the_focus_to_the_new_id() {
        let mut cache = HistoryCache::new();
        let placeholder = cache.upsert(fields("8.8.8.8", "City"));
        cache.set_active(placeholder);

        cache.promote("8.8.8.8", 40);

        assert_eq!(cache.active(), Some(RecordId::Durable(40)));
        assert_eq!(cache.active_record().unwrap().ip, "8.8.8.8");
    }

    #[test]
    fn remove_many_prunes_selection_and_focus() {
        let mut cache = seeded_cache();
        cache.toggle_selection(RecordId::Durable(1));
        cache.toggle_selection(RecordId::Durable(2));
        cache.set_active(RecordId::Durable(2));

        let removed = cache.remove_many(&[RecordId::Durable(2), RecordId::Durable(99)]);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].ip, "8.8.8.8");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.active(), None);
        assert_eq!(cache.selection().ids(), vec![RecordId::Durable(1)]);
    }

    #[test]
    fn remove_many_keeps_unrelated_focus() {
        let mut cache = seeded_cache();
        cache.set_active(RecordId::Durable(3));
        cache.remove_many(&[RecordId::Durable(1)]);
        assert_eq!(cache.active(), Some(RecordId::Durable(3)));
    }

    #[test]
    fn replace_all_discards_local_state_but_keeps_surviving_marks() {
        let mut cache = seeded_cache();
        cache.upsert(fields("203.0.113.9", "Optimistic"));
        cache.toggle_selection(RecordId::Durable(1));
        cache.toggle_selection(RecordId::Durable(3));
        cache.set_active(RecordId::Durable(3));

        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        cache.replace_all(vec![
            durable_record(5, "198.51.100.7", base),
            durable_record(1, "1.1.1.1", base),
        ]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("203.0.113.9").is_none());
        assert_eq!(cache.selection().ids(), vec![RecordId::Durable(1)]);
        assert_eq!(cache.active(), None);
    }

    #[test]
    fn select_all_skips_placeholders() {
        let mut cache = seeded_cache();
        cache.upsert(fields("203.0.113.9", "Unsaved"));

        cache.select_all();

        assert_eq!(cache.selection().len(), 3);
        assert_eq!(
            cache.selection().ids(),
            vec![
                RecordId::Durable(1),
                RecordId::Durable(2),
                RecordId::Durable(3)
            ]
        );
    }

    #[test]
    fn toggle_selection_ignores_uncached_ids() {
        let mut cache = seeded_cache();
        assert!(!cache.toggle_selection(RecordId::Durable(99)));
        assert!(cache.selection().is_empty());
    }

    #[test]
    fn toggle_selection_ignores_placeholders() {
        let mut cache = HistoryCache::new();
        let placeholder = cache.upsert(fields("8.8.8.8", "City"));
        assert!(!cache.toggle_selection(placeholder));
        assert!(cache.selection().is_empty());
    }

    #[test]
    fn set_active_clears_on_uncached_id() {
        let mut cache = seeded_cache();
        cache.set_active(RecordId::Durable(1));
        cache.set_active(RecordId::Durable(99));
        assert_eq!(cache.active(), None);
    }

    proptest! {
        #[test]
        fn upsert_sequences_never_duplicate_ips(octets in prop::collection::vec(0u8..8, 1..40)) {
            let mut cache = HistoryCache::new();
            for octet in &octets {
                cache.upsert(fields(&format!("10.0.0.{octet}"), "City"));
            }

            let mut ips: Vec<&str> = cache.records().iter().map(|r| r.ip.as_str()).collect();
            let total = ips.len();
            ips.sort_unstable();
            ips.dedup();
            prop_assert_eq!(ips.len(), total);

            let mut ids: Vec<RecordId> = cache.records().iter().map(|r| r.id).collect();
            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }
}
