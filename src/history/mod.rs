//! Local history state: the optimistic cache and its satellites.
//!
//! Everything in this module is synchronous and network-free. The cache
//! mutates instantly on lookup results, the selection set and active-record
//! tracker ride along with it, and the deletion workflow sequences the
//! confirm-then-delete flow. Reconciliation with the history store happens
//! one level up, in [`crate::session`].

mod cache;
mod deletion;
mod selection;
mod tracker;

pub use cache::{HistoryCache, PromoteOutcome};
pub use deletion::{DeletionPhase, DeletionPlan, DeletionWorkflow};
pub use selection::SelectionSet;
pub use tracker::ActiveRecordTracker;
