//! Contact domain model.

use serde::{Deserialize, Serialize};

/// Identity of a contact as reported by the contact source.
///
/// Stable across imports for the same physical contact, so it doubles as the
/// upsert key.
pub type ContactId = i64;

/// Local mirror row of one device contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    /// Display name. Nullable in the source feed.
    pub name: Option<String>,
    pub phone: String,
}

impl Contact {
    pub fn new(id: ContactId, name: Option<String>, phone: impl Into<String>) -> Self {
        Self {
            id,
            name,
            phone: phone.into(),
        }
    }

    /// Name for list rendering; empty when the source had none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
