//! Cache services: the expiring store, its background sweeper, the tiered
//! fetcher and the chunked batch writer.

pub mod batch_writer;
pub mod cache_sweeper;
pub mod expiring_store;
pub mod tiered_fetcher;

pub use batch_writer::BatchedWriter;
pub use cache_sweeper::{CacheSweeper, SweeperConfig, SweeperHandle, SweeperStatus};
pub use expiring_store::{ExpiringStore, SweepReport};
pub use tiered_fetcher::{collections, OptimizedRead, TieredFetcher};
