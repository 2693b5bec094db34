//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep session/FFI layers decoupled from storage details.

pub mod contact_service;
pub mod import_service;
pub mod note_service;
