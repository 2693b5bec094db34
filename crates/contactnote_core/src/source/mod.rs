//! Platform-facing contact source contracts.
//!
//! # Responsibility
//! - Define the read-only address book adapter consumed by import.
//! - Define the permission gate that must pass before import may run.
//!
//! # Invariants
//! - Sources are read-only; nothing in core writes back to the device.
//! - Row order is source defined and may differ between calls.

pub mod contact_source;
pub mod permission;
