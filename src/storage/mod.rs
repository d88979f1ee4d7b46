//! Storage Module
//!
//! This module provides the TTL store: a value table and an expiration index
//! kept behind one lock, an expiration heap that finds the next key to
//! expire without scanning, and a background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TtlStore                             │
//! │           Mutex ──┬── values       key → V                  │
//! │                   ├── expirations  key → Instant            │
//! │                   └── heap         soonest deadline first   │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use ttlkv::storage::{StoreConfig, TtlStore};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = TtlStore::with_config(
//!     StoreConfig::default().with_sweep_interval(Duration::from_millis(500)),
//! );
//!
//! store.set("name", "Ariz", Duration::from_secs(3600));
//! assert_eq!(store.get("name"), Ok("Ariz"));
//! assert!(store.contains("name"));
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod expiry;
pub mod heap;

// Re-export commonly used types
pub use engine::{StorageStats, StoreConfig, SweepReport, TtlStore, DEFAULT_TTL, MAX_TTL};
pub use error::{StoreError, StoreResult};
pub use expiry::{ExpiryConfig, ExpirySweeper};
pub use heap::{ExpiryHeap, ExpiryRecord};
