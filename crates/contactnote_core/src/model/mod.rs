//! Domain model for mirrored contacts and their notes.
//!
//! # Responsibility
//! - Define the records shared by import, repositories and sessions.
//!
//! # Invariants
//! - `Contact::id` comes from the contact source and is never generated here.
//! - `Note::id` is assigned by storage on first insert.
//! - At most one note exists per contact; the save path enforces it, the
//!   schema does not.

pub mod contact;
pub mod note;
