//! Listing filters, visibility scope and keyset pagination for applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Application, ApplicationId, ApplicationStatus};
use crate::domain::{DocumentTypeId, User, UserId};

/// Number of applications included in dashboard statistics.
pub const RECENT_APPLICATIONS: usize = 5;

/// Which rows a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    /// Every application.
    All,
    /// Only applications owned by this user.
    OwnedBy(UserId),
}

impl ApplicationScope {
    /// Visibility for an authenticated user: admins and staff see all rows,
    /// residents see their own.
    pub fn for_user(user: &User) -> Self {
        if user.sees_all_applications() {
            Self::All
        } else {
            Self::OwnedBy(*user.id())
        }
    }

    /// Whether the scope admits `application`.
    pub fn permits(&self, application: &Application) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(owner) => application.user_id() == owner,
        }
    }
}

/// Optional listing filters; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    /// Exact status.
    pub status: Option<ApplicationStatus>,
    /// Exact document type.
    pub document_type_id: Option<DocumentTypeId>,
    /// Case-insensitive substring of the purpose or tracking number.
    pub search: Option<String>,
    /// Inclusive lower bound on submission time.
    pub submitted_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on submission time.
    pub submitted_to: Option<DateTime<Utc>>,
}

impl ApplicationFilter {
    /// Normalised search needle; blank searches are ignored.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    /// In-process evaluation of the filter, mirroring the SQL predicate.
    pub fn matches(&self, application: &Application) -> bool {
        if self
            .status
            .is_some_and(|status| status != application.status())
        {
            return false;
        }
        if self
            .document_type_id
            .is_some_and(|id| &id != application.document_type_id())
        {
            return false;
        }
        if self
            .submitted_from
            .is_some_and(|from| application.submitted_at() < from)
        {
            return false;
        }
        if self
            .submitted_to
            .is_some_and(|to| application.submitted_at() > to)
        {
            return false;
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                application.purpose().as_ref().to_lowercase().contains(&term)
                    || application
                        .tracking_number()
                        .as_str()
                        .to_lowercase()
                        .contains(&term)
            }
        }
    }
}

/// Keyset position in the `submitted_at DESC, id DESC` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCursorKey {
    /// Submission time of the last row on the previous page.
    pub submitted_at: DateTime<Utc>,
    /// Identifier of the last row on the previous page.
    pub id: ApplicationId,
}

impl ApplicationCursorKey {
    /// Whether `application` sorts after this position.
    pub fn precedes(&self, application: &Application) -> bool {
        application.cursor_key() < *self
    }
}

/// One page of applications in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPage {
    /// Rows on this page.
    pub items: Vec<Application>,
    /// Position to resume from, when more rows exist.
    pub next: Option<ApplicationCursorKey>,
}

impl ApplicationPage {
    /// Build a page from `limit + 1` fetched rows.
    pub fn from_overfetch(mut rows: Vec<Application>, limit: usize) -> Self {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next = has_more
            .then(|| rows.last().map(Application::cursor_key))
            .flatten();
        Self { items: rows, next }
    }
}

/// Per-status totals within a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Every application.
    pub total: u64,
    /// Pending applications.
    pub pending: u64,
    /// Approved applications.
    pub approved: u64,
    /// Completed applications.
    pub completed: u64,
}

impl StatusCounts {
    /// Count one application with `status`.
    pub fn record(&mut self, status: ApplicationStatus) {
        self.record_many(status, 1);
    }

    /// Count `n` applications with `status`.
    pub fn record_many(&mut self, status: ApplicationStatus, n: u64) {
        self.total += n;
        match status {
            ApplicationStatus::Pending => self.pending += n,
            ApplicationStatus::Approved => self.approved += n,
            ApplicationStatus::Completed => self.completed += n,
            _ => {}
        }
    }
}

/// Dashboard summary for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Totals visible to the caller.
    pub counts: StatusCounts,
    /// Registered users; reported to admins only.
    pub user_count: Option<u64>,
    /// Most recent visible applications.
    pub recent: Vec<Application>,
}
