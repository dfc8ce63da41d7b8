//! In-memory [`ApplicationRepository`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{
    ApplicationListQuery, ApplicationPersistenceError, ApplicationRepository,
};
use crate::domain::{
    Application, ApplicationId, ApplicationScope, ApplicationStatus, StatusCounts,
    TrackingNumber,
};

use super::lock;

/// Map-backed application store.
#[derive(Debug, Default)]
pub struct InMemoryApplicationRepository {
    rows: Mutex<HashMap<ApplicationId, Application>>,
}

impl InMemoryApplicationRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one stored row, bypassing scope.
    pub fn stored(&self, id: &ApplicationId) -> Option<Application> {
        lock(&self.rows).get(id).cloned()
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(&self, application: &Application) -> Result<(), ApplicationPersistenceError> {
        let mut rows = lock(&self.rows);
        let duplicate = rows
            .values()
            .any(|row| row.tracking_number() == application.tracking_number());
        if duplicate {
            return Err(ApplicationPersistenceError::duplicate_tracking_number(
                application.tracking_number().as_str(),
            ));
        }
        if rows.contains_key(application.id()) {
            return Err(ApplicationPersistenceError::query(format!(
                "application {} already exists",
                application.id()
            )));
        }
        rows.insert(*application.id(), application.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> Result<bool, ApplicationPersistenceError> {
        let mut rows = lock(&self.rows);
        match rows.get_mut(application.id()) {
            Some(row) if row.status() == expected => {
                *row = application.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, ApplicationPersistenceError> {
        Ok(self.stored(id))
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Application>, ApplicationPersistenceError> {
        Ok(lock(&self.rows)
            .values()
            .find(|row| row.tracking_number() == tracking_number)
            .cloned())
    }

    async fn tracking_number_exists(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<bool, ApplicationPersistenceError> {
        Ok(lock(&self.rows)
            .values()
            .any(|row| row.tracking_number() == tracking_number))
    }

    async fn list(
        &self,
        query: &ApplicationListQuery,
    ) -> Result<Vec<Application>, ApplicationPersistenceError> {
        let rows = lock(&self.rows);
        let mut matching: Vec<Application> = rows
            .values()
            .filter(|row| query.scope.permits(row))
            .filter(|row| query.filter.matches(row))
            .filter(|row| query.after.is_none_or(|key| key.precedes(row)))
            .cloned()
            .collect();
        matching.sort_by_key(|row| std::cmp::Reverse(row.cursor_key()));
        matching.truncate(query.limit);
        Ok(matching)
    }

    async fn status_counts(
        &self,
        scope: &ApplicationScope,
    ) -> Result<StatusCounts, ApplicationPersistenceError> {
        let mut counts = StatusCounts::default();
        for row in lock(&self.rows).values().filter(|row| scope.permits(row)) {
            counts.record(row.status());
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationCursorKey, ApplicationFilter};
    use crate::test_support::applications::pending_for;
    use crate::test_support::clock::fixture_timestamp;
    use crate::test_support::users::{other_resident, resident};
    use chrono::Duration;
    use rstest::rstest;

    fn query(scope: ApplicationScope, after: Option<ApplicationCursorKey>) -> ApplicationListQuery {
        ApplicationListQuery {
            scope,
            filter: ApplicationFilter::default(),
            after,
            limit: 10,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_tracking_numbers_are_refused() {
        let repo = InMemoryApplicationRepository::new();
        let first = pending_for(&resident(), "BA00000001AAAA", fixture_timestamp());
        let second = pending_for(&resident(), "BA00000001AAAA", fixture_timestamp());
        repo.insert(&first).await.expect("first insert");
        let err = repo.insert(&second).await.expect_err("duplicate");
        assert!(matches!(
            err,
            ApplicationPersistenceError::DuplicateTrackingNumber { .. }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn list_applies_scope_order_and_cursor() {
        let repo = InMemoryApplicationRepository::new();
        let base = fixture_timestamp();
        let mine_old = pending_for(&resident(), "BA00000001AAAA", base);
        let theirs = pending_for(&other_resident(), "BA00000002AAAA", base + Duration::minutes(1));
        let mine_new = pending_for(&resident(), "BA00000003AAAA", base + Duration::minutes(2));
        for row in [&mine_old, &theirs, &mine_new] {
            repo.insert(row).await.expect("insert");
        }

        let scope = ApplicationScope::OwnedBy(*resident().id());
        let page = repo.list(&query(scope, None)).await.expect("list");
        assert_eq!(page, vec![mine_new.clone(), mine_old.clone()]);

        let rest = repo
            .list(&query(scope, Some(mine_new.cursor_key())))
            .await
            .expect("list after cursor");
        assert_eq!(rest, vec![mine_old]);

        let all = repo
            .list(&query(ApplicationScope::All, None))
            .await
            .expect("list all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[1], theirs);
    }

    #[rstest]
    #[tokio::test]
    async fn update_status_is_compare_and_set() {
        let repo = InMemoryApplicationRepository::new();
        let pending = pending_for(&resident(), "BA00000001AAAA", fixture_timestamp());
        repo.insert(&pending).await.expect("insert");
        let cancelled = pending
            .clone()
            .cancel(fixture_timestamp() + Duration::minutes(1))
            .expect("cancel");

        assert!(
            repo.update_status(&cancelled, ApplicationStatus::Pending)
                .await
                .expect("first update")
        );
        assert!(
            !repo
                .update_status(&cancelled, ApplicationStatus::Pending)
                .await
                .expect("stale update")
        );
        let counts = repo
            .status_counts(&ApplicationScope::All)
            .await
            .expect("counts");
        assert_eq!(counts.total, 1);
        assert_eq!(counts.pending, 0);
    }
}
