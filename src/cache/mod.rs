//! Local story cache and the network-first read path on top of it.
//!
//! This module provides:
//! - A SQLite snapshot of the last successfully fetched feed
//! - Network-first reads that fall back to the snapshot when the service
//!   can't be reached or answers with an error

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
