//! Configuration: constants, types, and defaults.

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
