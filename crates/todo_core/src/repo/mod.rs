//! Repository layer: local task store and the sync-aware facade over it.
//!
//! # Responsibility
//! - Define the local persistence contract and its SQLite implementation.
//! - Deliver live full-list snapshots to subscribers.
//! - Mirror local mutations to the cloud without making them depend on it.
//!
//! # Invariants
//! - Store writes validate task content before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod live;
pub mod sync_repo;
pub mod task_store;
