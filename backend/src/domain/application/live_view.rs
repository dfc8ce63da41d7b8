//! Client-side list kept current from change notifications.

use super::{Application, ApplicationChange, ApplicationScope};

/// Visible applications in listing order, refreshed from the change feed.
///
/// Applying a snapshot is idempotent: a snapshot whose `updated_at` is not
/// newer than the held copy is ignored, so replays and out-of-order delivery
/// never regress a row.
#[derive(Debug, Clone)]
pub struct LiveApplicationList {
    scope: ApplicationScope,
    items: Vec<Application>,
}

impl LiveApplicationList {
    /// Start from an initial listing.
    pub fn new(scope: ApplicationScope, initial: Vec<Application>) -> Self {
        let mut list = Self {
            scope,
            items: Vec::with_capacity(initial.len()),
        };
        for application in initial {
            list.upsert(application);
        }
        list
    }

    /// Fold one change into the list. Returns whether the list changed.
    pub fn apply(&mut self, change: &ApplicationChange) -> bool {
        if !self.scope.permits(&change.application) {
            return false;
        }
        self.upsert(change.application.clone())
    }

    fn upsert(&mut self, application: Application) -> bool {
        let existing = self
            .items
            .iter()
            .position(|held| held.id() == application.id());
        match existing {
            Some(index) => {
                if self.items[index].updated_at() >= application.updated_at() {
                    return false;
                }
                self.items.remove(index);
            }
            None if !self.scope.permits(&application) => return false,
            None => {}
        }
        let key = application.cursor_key();
        let at = self
            .items
            .partition_point(|held| held.cursor_key() > key);
        self.items.insert(at, application);
        true
    }

    /// Current rows, newest first.
    pub fn items(&self) -> &[Application] {
        &self.items
    }

    /// Look up one row.
    pub fn get(&self, id: &super::ApplicationId) -> Option<&Application> {
        self.items.iter().find(|held| held.id() == id)
    }
}
