//! CLI-facing helpers: query validation and terminal output.

pub mod output;
pub mod query;

pub use output::{confirm, print_error_summary, print_history, print_ip_info};
pub use query::{resolve_selection_token, validate_ip_query};
