//! The lookup session: local optimism reconciled with the history store.
//!
//! A session owns the history cache, the selection set, the active-record
//! tracker, and the deletion workflow, and it is the only thing that talks
//! to the network on their behalf. Every operation follows the same
//! pattern:
//!
//! 1. mutate the local cache synchronously, so results appear instantly
//! 2. tell the history store asynchronously
//! 3. reconcile the store's answer back into the cache (promote the
//!    durable id), or resync wholesale when the store disagrees or fails
//!
//! Methods take `&mut self`, so a session has exactly one caller at a time
//! and the cache needs no interior locking. Interleaving happens only at
//! `.await` points, between operations, never inside one.

use log::{debug, warn};

use crate::api::{history_store, lookup, ApiContext};
use crate::config::Config;
use crate::error_handling::{ApiError, DeletionError, ErrorKind, ErrorStats, InitializationError};
use crate::history::{
    DeletionPhase, DeletionPlan, DeletionWorkflow, HistoryCache, PromoteOutcome, SelectionSet,
};
use crate::models::{HistoryRecord, IpInfo, RecordFields, RecordId};

/// What a single lookup produced.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    /// The geolocation data the lookup service returned.
    pub info: IpInfo,
    /// Identifier of the history record at the end of the flow.
    pub record_id: RecordId,
    /// True if the lookup created a new history record, false if it
    /// refreshed an existing one.
    pub created: bool,
    /// True if the history store confirmed the write. False means the save
    /// failed and the session fell back to a resync; the lookup itself
    /// still succeeded.
    pub confirmed: bool,
}

/// Summary of a completed deletion.
#[derive(Debug, Clone)]
pub struct DeletionReport {
    /// Number of records removed from the local cache.
    pub removed: usize,
    /// Durable ids sent to the store; empty for a local-only deletion.
    pub remote_ids: Vec<u64>,
    /// True if the displayed record was among the deleted and a fresh
    /// own-IP lookup repopulated the display.
    pub display_refreshed: bool,
}

/// A single user's lookup session.
pub struct LookupSession {
    ctx: ApiContext,
    cache: HistoryCache,
    deletion: DeletionWorkflow,
    displayed: Option<IpInfo>,
    stats: ErrorStats,
}

impl LookupSession {
    /// Creates a session from client configuration.
    pub fn new(config: &Config) -> Result<Self, InitializationError> {
        Ok(Self::with_context(ApiContext::new(config)?))
    }

    /// Creates a session over an existing API context.
    pub fn with_context(ctx: ApiContext) -> Self {
        LookupSession {
            ctx,
            cache: HistoryCache::new(),
            deletion: DeletionWorkflow::new(),
            displayed: None,
            stats: ErrorStats::new(),
        }
    }

    /// Cached history records in display order.
    pub fn records(&self) -> &[HistoryRecord] {
        self.cache.records()
    }

    /// The info currently driving the display, if any.
    pub fn displayed(&self) -> Option<&IpInfo> {
        self.displayed.as_ref()
    }

    /// The focused history record, if any.
    pub fn active_record(&self) -> Option<&HistoryRecord> {
        self.cache.active_record()
    }

    /// Identifier of the focused record, if any.
    pub fn active(&self) -> Option<RecordId> {
        self.cache.active()
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionSet {
        self.cache.selection()
    }

    /// Error counters accumulated by this session.
    pub fn error_stats(&self) -> &ErrorStats {
        &self.stats
    }

    /// Where the deletion workflow currently stands.
    pub fn deletion_phase(&self) -> DeletionPhase {
        self.deletion.phase()
    }

    /// Reloads the cache wholesale from the history store.
    ///
    /// This is the session's one recovery primitive: any time local state
    /// and the store may disagree, the store's list replaces the cache.
    /// Returns the number of records loaded.
    pub async fn resync(&mut self) -> Result<usize, ApiError> {
        match history_store::fetch_history(&self.ctx).await {
            Ok(records) => {
                let count = records.len();
                self.cache.replace_all(records);
                debug!("resynchronized {count} history records");
                Ok(count)
            }
            Err(e) => {
                self.stats.increment(ErrorKind::HistoryLoadError);
                Err(e)
            }
        }
    }

    /// Starts the session: loads the stored history, then looks up the
    /// caller's own IP so the display begins populated.
    ///
    /// A failed history load only logs; it must not stop the lookup.
    pub async fn start(&mut self) -> Result<LookupOutcome, ApiError> {
        if let Err(e) = self.resync().await {
            warn!("initial history load failed: {e}");
        }
        self.lookup(None).await
    }

    /// Looks up `ip` (or the caller's own IP for `None`) and reconciles the
    /// result into the history.
    ///
    /// On lookup success the cache is updated synchronously, before the
    /// store write: a new IP is inserted at the head under a placeholder
    /// id, a known IP is refreshed in place. The store write then runs in
    /// the background of the user's perception; its receipt promotes the
    /// placeholder to the durable id. If the write fails, the session logs,
    /// counts the failure, and resyncs so the cache converges back to
    /// server truth.
    ///
    /// On lookup failure nothing changes: no cache mutation, no store
    /// write, and whatever was displayed stays displayed.
    pub async fn lookup(&mut self, ip: Option<&str>) -> Result<LookupOutcome, ApiError> {
        let info = match lookup::fetch_ip_info(&self.ctx, ip).await {
            Ok(info) => info,
            Err(e) => {
                self.stats.increment(ErrorKind::for_lookup(&e));
                return Err(e);
            }
        };

        let fields = RecordFields::from(&info);
        let ip_key = fields.ip.clone();
        let created = self.cache.get(&ip_key).is_none();

        let optimistic_id = self.cache.upsert(fields.clone());
        self.cache.set_active(optimistic_id);
        self.displayed = Some(info.clone());

        let confirmed = match history_store::save_record(&self.ctx, &fields).await {
            Ok(receipt) => {
                self.apply_receipt(&ip_key, receipt.id);
                true
            }
            Err(e) => {
                self.stats.increment(ErrorKind::HistorySaveError);
                warn!("history save for {ip_key} failed: {e}; resynchronizing");
                if let Err(resync_err) = self.resync().await {
                    warn!("resynchronization after failed save also failed: {resync_err}");
                }
                // if the store already knew the IP, keep it focused
                if let Some(id) = self.cache.get(&ip_key).map(|record| record.id) {
                    self.cache.set_active(id);
                }
                false
            }
        };

        let record_id = self
            .cache
            .get(&ip_key)
            .map(|record| record.id)
            .unwrap_or(optimistic_id);
        Ok(LookupOutcome {
            info,
            record_id,
            created,
            confirmed,
        })
    }

    /// Applies a save receipt, logging conflicts instead of surfacing them.
    fn apply_receipt(&mut self, ip: &str, durable_id: u64) {
        match self.cache.promote(ip, durable_id) {
            PromoteOutcome::Promoted => {
                debug!("{ip} promoted to durable id {durable_id}");
            }
            PromoteOutcome::AlreadyDurable => {}
            PromoteOutcome::Conflict { held } => {
                self.stats.increment(ErrorKind::ReconciliationConflict);
                let conflict = ApiError::ReconciliationConflict {
                    ip: ip.to_string(),
                    held,
                    proposed: durable_id,
                };
                warn!("{conflict}");
            }
            PromoteOutcome::NotFound => {
                debug!("store confirmed {ip}, but it is no longer cached");
            }
        }
    }

    /// Displays a cached record without touching the network.
    ///
    /// Returns the record and focuses it; the display rebuilds from cached
    /// fields, so lookup-only extras (org, postal, timezone) come back
    /// empty until the IP is looked up again.
    pub fn recall(&mut self, ip: &str) -> Option<HistoryRecord> {
        let record = self.cache.get(ip)?.clone();
        self.cache.set_active(record.id);
        self.displayed = Some(IpInfo::from(&record));
        Some(record)
    }

    /// Toggles selection for a cached record; placeholders and unknown ids
    /// are no-ops. Returns whether the id is selected afterwards.
    pub fn toggle_selection(&mut self, id: RecordId) -> bool {
        self.cache.toggle_selection(id)
    }

    /// Selects every durable record.
    pub fn select_all(&mut self) {
        self.cache.select_all();
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        self.cache.clear_selection();
    }

    /// Snapshots the current selection into a deletion plan and waits for
    /// confirmation.
    pub fn begin_deletion(&mut self) -> Result<DeletionPlan, DeletionError> {
        let ids = self.cache.selection().ids();
        Ok(self.deletion.request(ids)?.clone())
    }

    /// Abandons the pending deletion plan, if any.
    pub fn cancel_deletion(&mut self) {
        self.deletion.cancel();
    }

    /// Runs the confirmed deletion end to end.
    ///
    /// Placeholder-only plans never touch the network: the records exist
    /// nowhere but this cache, so they are simply dropped. Plans with
    /// durable ids send one bulk delete; on success the records leave the
    /// cache, the selection clears, the display refreshes if its record was
    /// deleted, and a final resync reconfirms server truth. On failure the
    /// store's state is unknown, so the session resyncs and surfaces the
    /// error.
    pub async fn confirm_deletion(&mut self) -> Result<DeletionReport, DeletionError> {
        let plan = self.deletion.begin()?;

        if plan.is_local_only() {
            let removed = self.cache.remove_many(&plan.cache_ids());
            self.deletion.finish();
            debug!("dropped {} never-persisted records locally", removed.len());
            return Ok(DeletionReport {
                removed: removed.len(),
                remote_ids: Vec::new(),
                display_refreshed: false,
            });
        }

        match history_store::delete_records(&self.ctx, &plan.remote_ids).await {
            Ok(()) => {
                let removed = self.cache.remove_many(&plan.cache_ids());
                self.cache.clear_selection();
                let display_refreshed = self.refresh_display_if_deleted(&removed).await;
                if let Err(e) = self.resync().await {
                    warn!("resynchronization after deletion failed: {e}");
                }
                self.deletion.finish();
                Ok(DeletionReport {
                    removed: removed.len(),
                    remote_ids: plan.remote_ids,
                    display_refreshed,
                })
            }
            Err(e) => {
                self.stats.increment(ErrorKind::HistoryDeleteError);
                warn!("bulk delete failed: {e}; resynchronizing");
                if let Err(resync_err) = self.resync().await {
                    warn!("resynchronization after failed deletion also failed: {resync_err}");
                }
                self.deletion.finish();
                Err(e.into())
            }
        }
    }

    /// If the displayed record was just deleted, repopulate the display
    /// with a fresh own-IP lookup.
    async fn refresh_display_if_deleted(&mut self, removed: &[HistoryRecord]) -> bool {
        let Some(displayed_ip) = self.displayed.as_ref().map(|info| info.ip.clone()) else {
            return false;
        };
        if !removed.iter().any(|record| record.ip == displayed_ip) {
            return false;
        }
        debug!("displayed record {displayed_ip} was deleted; looking up own IP");
        match self.lookup(None).await {
            Ok(_) => true,
            Err(e) => {
                warn!("own-IP lookup after deletion failed: {e}");
                // the displayed record no longer exists anywhere; blank the
                // display rather than show deleted data
                self.displayed = None;
                false
            }
        }
    }
}
