//! Domain model for habits and their completion logs.
//!
//! # Responsibility
//! - Define the canonical records persisted by the store.
//! - Own field validation so every write path shares one rule set.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - A missing log entry and a `false` entry both mean "not completed".

pub mod habit;
pub mod state;
