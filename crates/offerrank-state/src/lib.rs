//! offerrank-state: embedded task store for offerrank.
//!
//! Backed by [redb](https://docs.rs/redb), holds the scheduler's task
//! records so the ranking engine can count how many tasks are still
//! starting on each host.
//!
//! Task records are JSON-serialized into redb's `&[u8]` value column and
//! keyed by task id. The `StateStore` is `Clone` + `Send` + `Sync` (backed
//! by `Arc<Database>`) and can be shared across scheduling rounds.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
