//! Flutter-facing bindings for `taskflow_core`.

pub mod api;
