//! Application lifecycle engine.
//!
//! Implements the [`ApplicationCommand`] and [`ApplicationQuery`] driving
//! ports. Every operation checks, in order: that the caller may act, that
//! the application exists and is visible, that the status graph allows the
//! move, and only then the decision payload. A refusal at any step leaves the
//! stored record untouched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageParams;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    ApplicationChangeFeed, ApplicationCommand, ApplicationListQuery, ApplicationPersistenceError,
    ApplicationQuery, ApplicationRepository, DocumentTypePersistenceError,
    DocumentTypeRepository, ProcessApplicationRequest, SubmitApplicationRequest,
    UserPersistenceError, UserProfileRepository,
};
use crate::domain::{
    Application, ApplicationChange, ApplicationCursorKey, ApplicationFilter, ApplicationId,
    ApplicationPage, ApplicationScope, ApplicationStatus, ApplicationValidationError,
    DashboardStats, DocumentType, LifecycleError, NewApplication, ProcessAction, Purpose,
    RECENT_APPLICATIONS, RejectionReason, ReviewDecision, TrackingNumber, TransitionError, User,
    parse_notes,
};

/// Attempts at finding an unused tracking number before giving up.
pub const MAX_TRACKING_ATTEMPTS: usize = 5;

fn map_application_error(error: ApplicationPersistenceError) -> LifecycleError {
    match error {
        ApplicationPersistenceError::Connection { message } => {
            LifecycleError::unavailable(format!("application repository unavailable: {message}"))
        }
        other => LifecycleError::storage(other.to_string()),
    }
}

fn map_document_type_error(error: DocumentTypePersistenceError) -> LifecycleError {
    match error {
        DocumentTypePersistenceError::Connection { message } => LifecycleError::unavailable(
            format!("document type repository unavailable: {message}"),
        ),
        DocumentTypePersistenceError::Query { message } => LifecycleError::storage(message),
    }
}

fn map_user_error(error: UserPersistenceError) -> LifecycleError {
    match error {
        UserPersistenceError::Connection { message } => {
            LifecycleError::unavailable(format!("user repository unavailable: {message}"))
        }
        other => LifecycleError::storage(other.to_string()),
    }
}

fn ensure_active(user: &User) -> Result<(), LifecycleError> {
    if user.is_active() {
        Ok(())
    } else {
        Err(LifecycleError::authorization("account is deactivated"))
    }
}

fn ensure_admin(user: &User, action: &str) -> Result<(), LifecycleError> {
    ensure_active(user)?;
    if user.is_admin() {
        Ok(())
    } else {
        Err(LifecycleError::authorization(format!(
            "only administrators can {action} applications"
        )))
    }
}

/// Adapters the lifecycle service depends on.
pub struct ApplicationLifecyclePorts<R, D, U> {
    /// Application rows.
    pub applications: Arc<R>,
    /// Document catalogue.
    pub document_types: Arc<D>,
    /// Profiles, for dashboard user counts.
    pub users: Arc<U>,
    /// Live change notifications.
    pub changes: Arc<dyn ApplicationChangeFeed>,
}

/// Lifecycle engine over repository ports.
pub struct ApplicationLifecycleService<R, D, U> {
    applications: Arc<R>,
    document_types: Arc<D>,
    users: Arc<U>,
    changes: Arc<dyn ApplicationChangeFeed>,
    clock: Arc<dyn Clock>,
    rng: Mutex<SmallRng>,
}

impl<R, D, U> ApplicationLifecycleService<R, D, U> {
    /// Create a service with an entropy-seeded tracking number generator.
    pub fn new(ports: ApplicationLifecyclePorts<R, D, U>, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(ports, clock, SmallRng::from_entropy())
    }

    /// Create a service with a caller-supplied generator.
    pub fn with_rng(
        ports: ApplicationLifecyclePorts<R, D, U>,
        clock: Arc<dyn Clock>,
        rng: SmallRng,
    ) -> Self {
        let ApplicationLifecyclePorts {
            applications,
            document_types,
            users,
            changes,
        } = ports;
        Self {
            applications,
            document_types,
            users,
            changes,
            clock,
            rng: Mutex::new(rng),
        }
    }

    fn tracking_candidate(&self) -> TrackingNumber {
        let now = self.clock.utc();
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        TrackingNumber::generate(now, &mut *rng)
    }
}

impl<R, D, U> ApplicationLifecycleService<R, D, U>
where
    R: ApplicationRepository,
    D: DocumentTypeRepository,
    U: UserProfileRepository,
{
    async fn load(&self, id: &ApplicationId) -> Result<Application, LifecycleError> {
        self.applications
            .find_by_id(id)
            .await
            .map_err(map_application_error)?
            .ok_or_else(|| LifecycleError::not_found(id))
    }

    async fn load_visible(
        &self,
        acting_user: &User,
        id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        let application = self.load(id).await?;
        if ApplicationScope::for_user(acting_user).permits(&application) {
            Ok(application)
        } else {
            Err(LifecycleError::not_found(id))
        }
    }

    async fn requested_document_type(
        &self,
        request: &SubmitApplicationRequest,
    ) -> Result<DocumentType, LifecycleError> {
        let document_type = self
            .document_types
            .find_by_id(&request.document_type_id)
            .await
            .map_err(map_document_type_error)?
            .ok_or(ApplicationValidationError::UnknownDocumentType)?;
        if !document_type.is_active() {
            return Err(ApplicationValidationError::InactiveDocumentType.into());
        }
        Ok(document_type)
    }

    /// Persist a transition guarded by the previous status.
    ///
    /// A concurrent writer that moved the row first turns this into an
    /// invalid transition from whatever status it left behind.
    async fn commit_transition(
        &self,
        next: Application,
        previous: ApplicationStatus,
    ) -> Result<Application, LifecycleError> {
        let written = self
            .applications
            .update_status(&next, previous)
            .await
            .map_err(map_application_error)?;
        if !written {
            let current = self.load(next.id()).await?;
            return Err(TransitionError::new(current.status(), next.status()).into());
        }
        self.changes.publish(ApplicationChange::updated(next.clone()));
        Ok(next)
    }
}

#[async_trait]
impl<R, D, U> ApplicationCommand for ApplicationLifecycleService<R, D, U>
where
    R: ApplicationRepository,
    D: DocumentTypeRepository,
    U: UserProfileRepository,
{
    async fn submit(
        &self,
        acting_user: &User,
        request: SubmitApplicationRequest,
    ) -> Result<Application, LifecycleError> {
        ensure_active(acting_user)?;
        let purpose = Purpose::new(&request.purpose)?;
        let document_type = self.requested_document_type(&request).await?;
        let input = NewApplication {
            user_id: *acting_user.id(),
            document_type_id: *document_type.id(),
            purpose,
            attachments: request.attachments,
        };

        for attempt in 1..=MAX_TRACKING_ATTEMPTS {
            let candidate = self.tracking_candidate();
            let taken = self
                .applications
                .tracking_number_exists(&candidate)
                .await
                .map_err(map_application_error)?;
            if taken {
                debug!(attempt, tracking_number = %candidate, "tracking number collision");
                continue;
            }
            let application = Application::submit(input.clone(), candidate, self.clock.utc())?;
            match self.applications.insert(&application).await {
                Ok(()) => {
                    info!(
                        application_id = %application.id(),
                        tracking_number = %application.tracking_number(),
                        user_id = %acting_user.id(),
                        "application submitted"
                    );
                    self.changes
                        .publish(ApplicationChange::inserted(application.clone()));
                    return Ok(application);
                }
                Err(ApplicationPersistenceError::DuplicateTrackingNumber { tracking_number }) => {
                    debug!(attempt, %tracking_number, "tracking number taken during insert");
                }
                Err(other) => return Err(map_application_error(other)),
            }
        }
        warn!(
            attempts = MAX_TRACKING_ATTEMPTS,
            "could not allocate a unique tracking number"
        );
        Err(LifecycleError::storage(
            "could not allocate a unique tracking number",
        ))
    }

    async fn process(
        &self,
        acting_user: &User,
        request: ProcessApplicationRequest,
    ) -> Result<Application, LifecycleError> {
        ensure_admin(acting_user, "process")?;
        let application = self.load(&request.application_id).await?;
        let target = match request.action {
            ProcessAction::Approve => ApplicationStatus::Approved,
            ProcessAction::Reject => ApplicationStatus::Rejected,
        };
        let previous = application.status();
        if previous != ApplicationStatus::Pending {
            return Err(TransitionError::new(previous, target).into());
        }
        let notes = parse_notes(request.notes.as_deref())?;
        let decision = match request.action {
            ProcessAction::Approve => ReviewDecision::Approve { notes },
            ProcessAction::Reject => {
                let reason = RejectionReason::parse(request.rejection_reason.as_deref())?
                    .ok_or(LifecycleError::MissingReason)?;
                ReviewDecision::Reject { reason, notes }
            }
        };
        let next = application.process(decision, *acting_user.id(), self.clock.utc())?;
        let next = self.commit_transition(next, previous).await?;
        info!(
            application_id = %next.id(),
            status = %next.status(),
            processed_by = %acting_user.id(),
            "application processed"
        );
        Ok(next)
    }

    async fn cancel(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        ensure_active(acting_user)?;
        let application = self.load_visible(acting_user, application_id).await?;
        if application.user_id() != acting_user.id() {
            return Err(LifecycleError::authorization(
                "only the applicant can cancel an application",
            ));
        }
        let previous = application.status();
        let next = application.cancel(self.clock.utc())?;
        let next = self.commit_transition(next, previous).await?;
        info!(application_id = %next.id(), "application cancelled");
        Ok(next)
    }

    async fn complete(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        ensure_admin(acting_user, "complete")?;
        let application = self.load(application_id).await?;
        let previous = application.status();
        let next = application.complete(self.clock.utc())?;
        let next = self.commit_transition(next, previous).await?;
        info!(application_id = %next.id(), "application completed");
        Ok(next)
    }
}

#[async_trait]
impl<R, D, U> ApplicationQuery for ApplicationLifecycleService<R, D, U>
where
    R: ApplicationRepository,
    D: DocumentTypeRepository,
    U: UserProfileRepository,
{
    async fn list(
        &self,
        acting_user: &User,
        filter: &ApplicationFilter,
        page: &PageParams,
    ) -> Result<ApplicationPage, LifecycleError> {
        ensure_active(acting_user)?;
        let scope = ApplicationScope::for_user(acting_user);
        let after = page
            .cursor::<ApplicationCursorKey>()
            .transpose()
            .map_err(|_| ApplicationValidationError::InvalidCursor)?
            .map(|cursor| cursor.into_inner());
        let mut rows = self
            .applications
            .list(&ApplicationListQuery {
                scope,
                filter: filter.clone(),
                after,
                limit: page.limit() + 1,
            })
            .await
            .map_err(map_application_error)?;
        let fetched = rows.len();
        rows.retain(|application| scope.permits(application));
        if rows.len() != fetched {
            warn!(
                dropped = fetched - rows.len(),
                user_id = %acting_user.id(),
                "repository returned rows outside the caller's scope"
            );
        }
        Ok(ApplicationPage::from_overfetch(rows, page.limit()))
    }

    async fn get(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError> {
        ensure_active(acting_user)?;
        self.load_visible(acting_user, application_id).await
    }

    async fn find_by_tracking_number(
        &self,
        acting_user: &User,
        tracking_number: &str,
    ) -> Result<Application, LifecycleError> {
        ensure_active(acting_user)?;
        let tracking_number = TrackingNumber::parse(tracking_number)
            .map_err(|_| ApplicationValidationError::InvalidTrackingNumber)?;
        let application = self
            .applications
            .find_by_tracking_number(&tracking_number)
            .await
            .map_err(map_application_error)?
            .filter(|application| ApplicationScope::for_user(acting_user).permits(application))
            .ok_or_else(|| LifecycleError::not_found(&tracking_number))?;
        Ok(application)
    }

    async fn dashboard_stats(&self, acting_user: &User) -> Result<DashboardStats, LifecycleError> {
        ensure_active(acting_user)?;
        let scope = ApplicationScope::for_user(acting_user);
        let counts = self
            .applications
            .status_counts(&scope)
            .await
            .map_err(map_application_error)?;
        let user_count = if acting_user.is_admin() {
            Some(self.users.count().await.map_err(map_user_error)?)
        } else {
            None
        };
        let recent = self
            .applications
            .list(&ApplicationListQuery {
                scope,
                filter: ApplicationFilter::default(),
                after: None,
                limit: RECENT_APPLICATIONS,
            })
            .await
            .map_err(map_application_error)?;
        Ok(DashboardStats {
            counts,
            user_count,
            recent,
        })
    }

    async fn document_types(&self) -> Result<Vec<DocumentType>, LifecycleError> {
        self.document_types
            .list_active()
            .await
            .map_err(map_document_type_error)
    }
}

#[cfg(test)]
#[path = "application_service_tests.rs"]
mod tests;
