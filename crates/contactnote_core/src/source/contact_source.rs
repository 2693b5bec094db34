//! Contact source adapter contract and host-fed implementation.

use crate::model::contact::{Contact, ContactId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SourceResult<T> = Result<T, SourceError>;

/// Failure while reading the platform address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Platform query could not run (provider missing, I/O fault, revoked access).
    Unavailable(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "contact source unavailable: {message}"),
        }
    }
}

impl Error for SourceError {}

/// One phone-numbered row as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContact {
    pub id: ContactId,
    pub display_name: Option<String>,
    pub phone_number: String,
}

impl From<SourceContact> for Contact {
    fn from(value: SourceContact) -> Self {
        Contact {
            id: value.id,
            name: value.display_name,
            phone: value.phone_number,
        }
    }
}

/// Read-only adapter over the device address book.
///
/// Implementations return the full current set on every call.
pub trait ContactSource {
    fn read_contacts(&self) -> SourceResult<Vec<SourceContact>>;
}

/// Source backed by rows the host platform already read.
///
/// Mobile hosts query the address book on their side and pass the
/// `(id, display name, phone)` tuples across the FFI boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticContactSource {
    rows: Vec<SourceContact>,
}

impl StaticContactSource {
    pub fn new(rows: Vec<SourceContact>) -> Self {
        Self { rows }
    }

    /// Builds a source from raw platform tuples.
    pub fn from_tuples<I, N, P>(tuples: I) -> Self
    where
        I: IntoIterator<Item = (ContactId, Option<N>, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let rows = tuples
            .into_iter()
            .map(|(id, name, phone)| SourceContact {
                id,
                display_name: name.map(Into::into),
                phone_number: phone.into(),
            })
            .collect();
        Self { rows }
    }
}

impl ContactSource for StaticContactSource {
    fn read_contacts(&self) -> SourceResult<Vec<SourceContact>> {
        Ok(self.rows.clone())
    }
}

impl<S: ContactSource + ?Sized> ContactSource for &S {
    fn read_contacts(&self) -> SourceResult<Vec<SourceContact>> {
        (**self).read_contacts()
    }
}

impl<S: ContactSource + ?Sized> ContactSource for std::sync::Arc<S> {
    fn read_contacts(&self) -> SourceResult<Vec<SourceContact>> {
        (**self).read_contacts()
    }
}
