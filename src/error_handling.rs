//! Error types and per-session error statistics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured base URL is not a valid absolute URL.
    #[error("Invalid base URL: {0}")]
    BaseUrlError(String),
}

/// Error types for database operations in the bundled history store.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored timestamp column holds a value outside the representable range.
    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Failures from the remote collaborators: the lookup service and the
/// history store.
///
/// Callers branch on the variant to decide what to tell the user; the
/// session decides separately which failures surface at all (lookup
/// errors do, background history-store errors only log).
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a usable response, or the response
    /// carried an unexpected error status.
    #[error("network failure from {endpoint}: {detail}")]
    NetworkFailure {
        /// API path the request was sent to.
        endpoint: String,
        /// Transport error text or the server-provided error message.
        detail: String,
        /// Underlying transport error, when one exists.
        #[source]
        source: Option<ReqwestError>,
    },

    /// The response decoded incorrectly or was missing a required field.
    #[error("invalid response from {endpoint}: {detail}")]
    InvalidResponse {
        /// API path the response came from.
        endpoint: String,
        /// What was wrong with the body.
        detail: String,
    },

    /// The service refused the request: forbidden or rate limited.
    #[error("access denied by {endpoint} (status {status}): {detail}")]
    AccessDenied {
        /// API path the request was sent to.
        endpoint: String,
        /// The refusing status code, 403 or 429.
        status: u16,
        /// Server-provided explanation, if any.
        detail: String,
    },

    /// The store confirmed a write with a durable id, but the local record
    /// already holds a different durable id. Logged, never surfaced.
    #[error("reconciliation conflict for {ip}: record holds id {held}, store confirmed {proposed}")]
    ReconciliationConflict {
        /// IP address of the conflicting record.
        ip: String,
        /// Durable id the local record already carries.
        held: u64,
        /// Durable id the store just confirmed.
        proposed: u64,
    },
}

/// Failures of the bulk-deletion flow.
#[derive(Error, Debug)]
pub enum DeletionError {
    /// A deletion was requested with nothing selected.
    #[error("nothing is selected for deletion")]
    EmptySelection,

    /// A deletion was requested or confirmed while one is already in flight.
    #[error("a deletion is already in progress")]
    DeletionInFlight,

    /// Confirmation arrived without a pending deletion plan.
    #[error("no deletion is awaiting confirmation")]
    NothingPending,

    /// The history store rejected or failed the bulk delete.
    #[error("history store delete failed: {0}")]
    Store(#[from] ApiError),
}

/// Categories of failures tracked across a session.
///
/// This enum categorizes different error conditions for tracking and reporting
/// purposes. Lookup failures are split by taxonomy variant; history-store
/// failures are split by operation, since those all surface differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorKind {
    /// Lookup failed in transport or with an unexpected status.
    LookupNetworkError,
    /// Lookup response was missing required fields or undecodable.
    LookupInvalidResponse,
    /// Lookup was refused upstream (403 or 429).
    LookupAccessDenied,
    /// History list could not be fetched.
    HistoryLoadError,
    /// History save did not reach the store.
    HistorySaveError,
    /// History bulk delete failed.
    HistoryDeleteError,
    /// A durable id arrived for a record already holding a different one.
    ReconciliationConflict,
}

impl ErrorKind {
    /// Human-readable label for the error summary.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LookupNetworkError => "Lookup network error",
            ErrorKind::LookupInvalidResponse => "Lookup invalid response",
            ErrorKind::LookupAccessDenied => "Lookup access denied",
            ErrorKind::HistoryLoadError => "History load error",
            ErrorKind::HistorySaveError => "History save error",
            ErrorKind::HistoryDeleteError => "History delete error",
            ErrorKind::ReconciliationConflict => "Reconciliation conflict",
        }
    }

    /// Classifies a lookup failure into its tracked category.
    pub fn for_lookup(error: &ApiError) -> ErrorKind {
        match error {
            ApiError::NetworkFailure { .. } => ErrorKind::LookupNetworkError,
            ApiError::InvalidResponse { .. } => ErrorKind::LookupInvalidResponse,
            ApiError::AccessDenied { .. } => ErrorKind::LookupAccessDenied,
            ApiError::ReconciliationConflict { .. } => ErrorKind::ReconciliationConflict,
        }
    }
}

/// Thread-safe error statistics tracker.
///
/// Tracks the count of each error kind using atomic counters. All kinds are
/// initialized to zero on creation, so increments never have to insert.
pub struct ErrorStats {
    errors: HashMap<ErrorKind, AtomicUsize>,
}

impl Default for ErrorStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorStats {
    /// Creates a tracker with every kind at zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for kind in ErrorKind::iter() {
            errors.insert(kind, AtomicUsize::new(0));
        }
        ErrorStats { errors }
    }

    /// Records one occurrence of `kind`.
    ///
    /// Every kind is registered by `new()`; a miss is logged instead of
    /// panicking.
    pub fn increment(&self, kind: ErrorKind) {
        if let Some(counter) = self.errors.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("No counter registered for {kind:?}");
        }
    }

    /// Current count for `kind`, zero if the kind was never registered.
    pub fn get_count(&self, kind: ErrorKind) -> usize {
        self.errors
            .get(&kind)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or_default()
    }

    /// Total failures recorded across all kinds.
    pub fn total(&self) -> usize {
        ErrorKind::iter().map(|kind| self.get_count(kind)).sum()
    }
}
