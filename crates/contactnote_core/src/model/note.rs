//! Note domain model.

use super::contact::ContactId;
use serde::{Deserialize, Serialize};

/// Storage-assigned note identity.
pub type NoteId = i64;

/// User-authored annotation attached to one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `None` until storage assigns an id on insert.
    pub id: Option<NoteId>,
    pub description: String,
    /// Serialized as `contactId` to match the persisted column name.
    #[serde(rename = "contactId")]
    pub contact_id: ContactId,
}

impl Note {
    /// Creates an unsaved note for a contact.
    pub fn new(contact_id: ContactId, description: impl Into<String>) -> Self {
        Self {
            id: None,
            description: description.into(),
            contact_id,
        }
    }

    /// Creates a note carrying an existing storage identity.
    ///
    /// Used by the save path to overwrite the contact's current note.
    pub fn with_id(id: NoteId, contact_id: ContactId, description: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            description: description.into(),
            contact_id,
        }
    }
}
