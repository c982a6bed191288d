//! ip_atlas library: IP geolocation lookups with a reconciled local history.
//!
//! The core of the crate is the optimistic lookup session: results land in
//! a local cache synchronously, under placeholder identities, and the
//! remote history store is told afterwards. Store confirmations promote
//! records to durable identities; whenever the store and the cache might
//! disagree, the session resynchronizes from the store wholesale. The
//! bundled [`store_server`] implements the store side over SQLite, so the
//! tool also runs self-hosted.
//!
//! # Example
//!
//! ```no_run
//! use ip_atlas::{Config, LookupSession};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     base_url: "http://localhost:8000".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut session = LookupSession::new(&config)?;
//! let outcome = session.lookup(Some("8.8.8.8")).await?;
//! println!("{} -> record {}", outcome.info.ip, outcome.record_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod config;
pub mod error_handling;
pub mod history;
pub mod initialization;
pub mod models;
pub mod session;
pub mod storage;
pub mod store_server;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use models::{HistoryRecord, IpInfo, RecordFields, RecordId};
pub use session::{DeletionReport, LookupOutcome, LookupSession};
