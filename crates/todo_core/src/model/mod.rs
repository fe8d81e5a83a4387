//! Domain model for to-do tasks.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one task shape for local storage, cloud documents and views.
//!
//! # Invariants
//! - Every stored task is identified by a store-assigned `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
