//! Contact permission gate.
//!
//! Import may only run after the host grants read access. Write access is
//! requested by convention as well, although nothing writes back to the
//! device.

/// Host capability guarding the address book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPermission {
    Read,
    Write,
}

impl ContactPermission {
    /// Stable string id used in logs and across FFI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read_contacts",
            Self::Write => "write_contacts",
        }
    }

    /// Parses the stable string id.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "read_contacts" => Some(Self::Read),
            "write_contacts" => Some(Self::Write),
            _ => None,
        }
    }
}

/// Current grant state for one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

impl PermissionState {
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Host-provided view of contact permission state.
pub trait PermissionGate {
    fn state(&self, permission: ContactPermission) -> PermissionState;

    /// Returns the first permission still missing before import may run.
    ///
    /// Read is checked before write, matching the host request order.
    fn first_missing(&self) -> Option<ContactPermission> {
        [ContactPermission::Read, ContactPermission::Write]
            .into_iter()
            .find(|permission| !self.state(*permission).is_granted())
    }
}

/// Gate carrying states reported by the host at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPermissionGate {
    pub read: PermissionState,
    pub write: PermissionState,
}

impl StaticPermissionGate {
    pub fn new(read_granted: bool, write_granted: bool) -> Self {
        Self {
            read: PermissionState::from_granted(read_granted),
            write: PermissionState::from_granted(write_granted),
        }
    }

    pub fn all_granted() -> Self {
        Self::new(true, true)
    }
}

impl PermissionGate for StaticPermissionGate {
    fn state(&self, permission: ContactPermission) -> PermissionState {
        match permission {
            ContactPermission::Read => self.read,
            ContactPermission::Write => self.write,
        }
    }
}
