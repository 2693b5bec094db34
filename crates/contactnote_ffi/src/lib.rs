//! Flutter-facing bindings for ContactNote core.

pub mod api;
