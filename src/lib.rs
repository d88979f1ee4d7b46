//! # ttlkv - An In-Process Key-Value Store with TTL Expiry
//!
//! ttlkv is a mutable associative cache for use inside a single process.
//! Every entry carries a time-to-live and removes itself once that runs out;
//! callers never need to delete stale entries by hand.
//!
//! ## Features
//!
//! - **Per-Entry TTL**: Each `set` picks its own deadline (10 hours by default)
//! - **Lazy + Active Expiry**: `get` evicts what it finds expired, and a
//!   background task sweeps the rest once a second
//! - **Expiration Heap**: The sweeper finds due keys without scanning the table
//! - **Thread Safe**: One lock serializes every operation
//! - **Clean Shutdown**: The sweeper can be stopped and joined
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          TtlStore                            │
//! │                                                              │
//! │   get / set / delete ───> ┌──────────────────────────────┐   │
//! │                           │ Mutex                        │   │
//! │                           │  values · expirations · heap │   │
//! │                           └──────────────────────────────┘   │
//! │                                          ▲                   │
//! │                                          │ every interval    │
//! │                           ┌──────────────┴───────────────┐   │
//! │                           │        ExpirySweeper         │   │
//! │                           │    (Background Tokio Task)   │   │
//! │                           └──────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ttlkv::{StoreError, TtlStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = TtlStore::new();
//!
//!     store.set("example1", "some value", Duration::from_secs(5));
//!     assert_eq!(store.get("example1"), Ok("some value"));
//!
//!     store.delete("example1");
//!     assert!(matches!(store.get("example1"), Err(StoreError::NotFound { .. })));
//!
//!     store.shutdown().await;
//! }
//! ```
//!
//! ## Expired vs. Not Found
//!
//! `get` reports [`StoreError::Expired`] the first time it meets a key whose
//! deadline has passed, and evicts it. Later lookups report
//! [`StoreError::NotFound`]. Keys removed by the sweeper before anyone reads
//! them are reported as `NotFound` directly. Callers that only care about a
//! hit or a miss can treat both errors the same.

pub mod storage;

// Re-export commonly used types for convenience
pub use storage::{
    ExpiryConfig, StorageStats, StoreConfig, StoreError, StoreResult, SweepReport, TtlStore,
    DEFAULT_TTL,
};

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
