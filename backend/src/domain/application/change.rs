//! Change notifications for application rows.

use super::Application;

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new application was submitted.
    Inserted,
    /// An existing application changed status.
    Updated,
}

impl ChangeKind {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }
}

/// Full snapshot of an application after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationChange {
    /// What happened.
    pub kind: ChangeKind,
    /// State after the change.
    pub application: Application,
}

impl ApplicationChange {
    /// A newly submitted application.
    pub fn inserted(application: Application) -> Self {
        Self {
            kind: ChangeKind::Inserted,
            application,
        }
    }

    /// An application after a transition.
    pub fn updated(application: Application) -> Self {
        Self {
            kind: ChangeKind::Updated,
            application,
        }
    }
}
