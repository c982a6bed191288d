//! SQLite persistence for the bundled history store server.

mod migrations;
mod pool;
mod queries;

pub use migrations::run_migrations;
pub use pool::init_db_pool;
pub use queries::{delete_history, list_history, upsert_history, SavedRow};
