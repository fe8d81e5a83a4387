//! Query engine for the task list view.
//!
//! # Responsibility
//! - Derive the displayed list from the full task list plus search text,
//!   filter selector and sort selector.
//! - Stay pure: no storage access, no state beyond the parameters.

pub mod engine;
pub mod params;
