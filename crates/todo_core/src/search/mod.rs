//! Keyword search entry points.
//!
//! # Responsibility
//! - Expose substring search over item title and description.
//! - Keep search result shaping inside core.

pub mod keyword;
