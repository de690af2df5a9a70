//! To-do domain model.
//!
//! # Responsibility
//! - Define the shared vocabulary exchanged between views and services.
//! - Keep derived aggregates (`Stats`) separate from stored records.
//!
//! # Invariants
//! - Shapes perform no I/O.
//! - Validation is explicit and never runs during deserialization.

pub mod stats;
pub mod todo;
