//! Persistence backends for the habit store.
//!
//! # Responsibility
//! - Define the load/save contract the store is written against.
//! - Isolate SQLite and serialization details from store orchestration.
//!
//! # Invariants
//! - A save replaces the whole aggregate; there are no partial writes.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod state_repo;
