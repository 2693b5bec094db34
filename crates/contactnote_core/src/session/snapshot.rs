//! In-memory snapshots consumed by the presentation layer.

use crate::model::contact::{Contact, ContactId};
use crate::model::note::Note;
use serde::{Deserialize, Serialize};

/// One list row: a contact and its note, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub contact: Contact,
    pub note: Option<Note>,
}

/// Copy of the contact and note tables taken after the last action.
///
/// Not a live view: it goes stale whenever storage changes elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub contacts: Vec<Contact>,
    pub notes: Vec<Note>,
}

impl Snapshot {
    pub fn new(contacts: Vec<Contact>, notes: Vec<Note>) -> Self {
        Self { contacts, notes }
    }

    /// First note owned by `contact_id` in snapshot order.
    pub fn note_for(&self, contact_id: ContactId) -> Option<&Note> {
        self.notes.iter().find(|note| note.contact_id == contact_id)
    }

    /// Joins contacts with their notes in contact order.
    pub fn entries(&self) -> Vec<ContactEntry> {
        self.contacts
            .iter()
            .map(|contact| ContactEntry {
                contact: contact.clone(),
                note: self.note_for(contact.id).cloned(),
            })
            .collect()
    }
}
