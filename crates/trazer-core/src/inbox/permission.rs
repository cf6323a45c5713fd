//! SMS read authorization.

use serde::{Deserialize, Serialize};

/// State of the user's grant to read the SMS inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Reading is allowed.
    Granted,
    /// Reading has not been allowed.
    #[default]
    Denied,
    /// Reading was refused before; the user should see why it is needed.
    ShouldShowRationale,
}

impl PermissionStatus {
    /// Whether the inbox may be read.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Text shown to the user when access is missing.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Granted => "",
            Self::Denied => "SMS permission is required for this feature.",
            Self::ShouldShowRationale => {
                "This app needs access to your SMS messages to function properly."
            }
        }
    }
}

/// Source of the SMS read authorization.
///
/// The reader consults the gate once per read and returns an empty result
/// when it is not granted. Requesting the permission and retrying is the
/// caller's job.
pub trait PermissionGate {
    /// Current permission state.
    fn status(&self) -> PermissionStatus;
}

impl PermissionGate for PermissionStatus {
    fn status(&self) -> PermissionStatus {
        *self
    }
}

impl<F> PermissionGate for F
where
    F: Fn() -> PermissionStatus,
{
    fn status(&self) -> PermissionStatus {
        self()
    }
}
