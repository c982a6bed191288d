//! The bulk-deletion workflow.
//!
//! Deleting history entries is a three-step flow with an explicit state
//! machine behind it:
//!
//! - `request` snapshots the ids into a [`DeletionPlan`] and waits for
//!   confirmation
//! - `begin` hands the confirmed plan to the caller and marks the delete
//!   as in flight
//! - `finish` returns to idle once the delete and its bookkeeping are done
//!
//! Only one bulk delete can be in flight at a time; a second request while
//! one is running is rejected rather than queued.

use crate::error_handling::DeletionError;
use crate::models::RecordId;

/// Where the deletion workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPhase {
    /// Nothing pending or running.
    #[default]
    Idle,
    /// A plan is waiting for explicit confirmation.
    Confirming,
    /// The bulk delete request is in flight.
    Deleting,
}

/// Snapshot of what a confirmed deletion will remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Durable identifiers to send to the history store, sorted.
    pub remote_ids: Vec<u64>,
    /// Never-persisted records to drop from the local cache only.
    pub local_only: Vec<RecordId>,
}

impl DeletionPlan {
    /// Builds a plan by splitting `ids` into the durable subset (which the
    /// store must delete) and the placeholder subset (which only exists
    /// locally and must not reach the store).
    pub fn partition(ids: impl IntoIterator<Item = RecordId>) -> Self {
        let mut remote_ids = Vec::new();
        let mut local_only = Vec::new();
        for id in ids {
            match id {
                RecordId::Durable(durable) => remote_ids.push(durable),
                RecordId::Placeholder(_) => local_only.push(id),
            }
        }
        remote_ids.sort_unstable();
        DeletionPlan {
            remote_ids,
            local_only,
        }
    }

    /// Every id the plan removes from the local cache.
    pub fn cache_ids(&self) -> Vec<RecordId> {
        self.remote_ids
            .iter()
            .map(|&durable| RecordId::Durable(durable))
            .chain(self.local_only.iter().copied())
            .collect()
    }

    /// True if no durable ids are planned, so the store is never contacted.
    pub fn is_local_only(&self) -> bool {
        self.remote_ids.is_empty()
    }

    /// Total number of records the plan covers.
    pub fn len(&self) -> usize {
        self.remote_ids.len() + self.local_only.len()
    }

    /// True if the plan covers nothing.
    pub fn is_empty(&self) -> bool {
        self.remote_ids.is_empty() && self.local_only.is_empty()
    }
}

/// State machine guarding the bulk-delete flow.
#[derive(Debug, Default)]
pub struct DeletionWorkflow {
    phase: DeletionPhase,
    plan: Option<DeletionPlan>,
}

impl DeletionWorkflow {
    /// Creates an idle workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    pub fn phase(&self) -> DeletionPhase {
        self.phase
    }

    /// The plan awaiting confirmation, if any.
    pub fn pending(&self) -> Option<&DeletionPlan> {
        self.plan.as_ref()
    }

    /// Requests deletion of `ids`, entering `Confirming`.
    ///
    /// A repeat request while still confirming replaces the pending plan;
    /// a request while a delete is in flight is rejected.
    pub fn request(
        &mut self,
        ids: impl IntoIterator<Item = RecordId>,
    ) -> Result<&DeletionPlan, DeletionError> {
        if self.phase == DeletionPhase::Deleting {
            return Err(DeletionError::DeletionInFlight);
        }
        let plan = DeletionPlan::partition(ids);
        if plan.is_empty() {
            return Err(DeletionError::EmptySelection);
        }
        self.phase = DeletionPhase::Confirming;
        Ok(self.plan.insert(plan))
    }

    /// Abandons a pending plan, returning to `Idle`.
    ///
    /// An in-flight delete cannot be cancelled; calling this while
    /// `Deleting` does nothing.
    pub fn cancel(&mut self) {
        if self.phase == DeletionPhase::Confirming {
            self.phase = DeletionPhase::Idle;
            self.plan = None;
        }
    }

    /// Takes the confirmed plan and enters `Deleting`.
    pub fn begin(&mut self) -> Result<DeletionPlan, DeletionError> {
        if self.phase == DeletionPhase::Deleting {
            return Err(DeletionError::DeletionInFlight);
        }
        let Some(plan) = self.plan.take() else {
            return Err(DeletionError::NothingPending);
        };
        self.phase = DeletionPhase::Deleting;
        Ok(plan)
    }

    /// Returns to `Idle` after the delete and its bookkeeping completed,
    /// successfully or not.
    pub fn finish(&mut self) {
        self.phase = DeletionPhase::Idle;
        self.plan = None;
    }
}
