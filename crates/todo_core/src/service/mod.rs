//! Core use-case services.
//!
//! # Responsibility
//! - Turn UI intents into repository calls with boundary validation.
//! - Keep presentation layers decoupled from storage and sync details.

pub mod task_service;
