//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate backend load/save cycles into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod habit_store;
