//! Cloud mirror collaborators.
//!
//! # Responsibility
//! - Define the remote document collection and identity contracts.
//! - Dispatch best-effort mirror writes off the caller's thread.
//!
//! # Invariants
//! - Nothing in this module can fail a local store operation.

pub mod cloud;
pub mod identity;
pub mod memory;
pub mod mirror;
