//! FFI crate root for Flutter bridge.

pub mod api;
