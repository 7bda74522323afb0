//! Domain layer for the advisor cache
//!
//! Models, port traits and error types. Nothing in here talks to SQLite,
//! the filesystem or the terminal directly.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
