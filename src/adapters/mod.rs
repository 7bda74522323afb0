//! Adapters implementing the domain ports.
//!
//! - `sqlite`: durable document store and key/value storage
//! - `memory`: process-local equivalents for tests and ephemeral runs

pub mod memory;
pub mod sqlite;
