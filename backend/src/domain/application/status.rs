//! Application status graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, awaiting review.
    Pending,
    /// Picked up by staff.
    UnderReview,
    /// Approved, awaiting release.
    Approved,
    /// Rejected with a reason.
    Rejected,
    /// Released to the resident.
    Completed,
    /// Withdrawn by the resident.
    Cancelled,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human label shown in listings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "Under Review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// One-line explanation for residents.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "Application submitted and waiting for review",
            Self::UnderReview => "Application is being reviewed by staff",
            Self::Approved => "Application approved and ready for processing",
            Self::Rejected => "Application rejected due to incomplete requirements",
            Self::Completed => "Document ready for pickup or delivered",
            Self::Cancelled => "Application cancelled by applicant",
        }
    }

    /// No further transitions leave this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// A reviewer has decided on the application.
    pub const fn is_reviewed(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Completed)
    }

    /// Whether the status graph has an edge from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::UnderReview | Self::Approved | Self::Rejected | Self::Cancelled
            ) | (Self::UnderReview, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Completed)
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_owned()))
    }
}

/// Reviewer action on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessAction {
    /// Approve the request.
    Approve,
    /// Reject the request.
    Reject,
}

/// A status change the graph does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {from} to {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: ApplicationStatus,
    /// Requested status.
    pub to: ApplicationStatus,
}

impl TransitionError {
    /// Build a transition error.
    pub const fn new(from: ApplicationStatus, to: ApplicationStatus) -> Self {
        Self { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApplicationStatus::Pending, ApplicationStatus::Approved, true)]
    #[case(ApplicationStatus::Pending, ApplicationStatus::Cancelled, true)]
    #[case(ApplicationStatus::UnderReview, ApplicationStatus::Rejected, true)]
    #[case(ApplicationStatus::Approved, ApplicationStatus::Completed, true)]
    #[case(ApplicationStatus::Approved, ApplicationStatus::Cancelled, false)]
    #[case(ApplicationStatus::Rejected, ApplicationStatus::Approved, false)]
    #[case(ApplicationStatus::Completed, ApplicationStatus::Pending, false)]
    #[case(ApplicationStatus::Pending, ApplicationStatus::Completed, false)]
    fn transition_graph(
        #[case] from: ApplicationStatus,
        #[case] to: ApplicationStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn terminal_statuses_have_no_exits() {
        for from in ApplicationStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(
                ApplicationStatus::ALL
                    .into_iter()
                    .all(|to| !from.can_transition_to(to)),
                "{from} should be terminal"
            );
        }
    }

    #[rstest]
    fn parses_wire_names() {
        assert_eq!(
            "under_review".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::UnderReview)
        );
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }
}
