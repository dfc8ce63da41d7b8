//! PostgreSQL-backed `ApplicationRepository` implementation using Diesel ORM.
//!
//! Applications and their attachments are written in one transaction.
//! Listing uses keyset pagination over `(submitted_at, id)` with visibility
//! scope and filters pushed into the `WHERE` clause.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    ApplicationListQuery, ApplicationPersistenceError, ApplicationRepository,
};
use crate::domain::{
    Application, ApplicationId, ApplicationRecord, ApplicationScope, ApplicationStatus,
    Attachment, AttachmentId, DocumentTypeId, FileType, StatusCounts, TrackingNumber, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{ApplicationRow, ApplicationStatusUpdate, AttachmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::{application_attachments, applications};

/// Diesel-backed application store.
#[derive(Clone)]
pub struct DieselApplicationRepository {
    pool: DbPool,
}

impl DieselApplicationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ApplicationPersistenceError {
    map_pool_error(error, ApplicationPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ApplicationPersistenceError {
    map_diesel_error(
        error,
        ApplicationPersistenceError::query,
        ApplicationPersistenceError::connection,
    )
}

fn corrupt(id: Uuid, detail: impl std::fmt::Display) -> ApplicationPersistenceError {
    ApplicationPersistenceError::corrupt(format!("application {id}: {detail}"))
}

fn application_to_row(application: &Application) -> ApplicationRow {
    ApplicationRow {
        id: *application.id().as_uuid(),
        user_id: *application.user_id().as_uuid(),
        document_type_id: *application.document_type_id().as_uuid(),
        purpose: application.purpose().as_ref().to_owned(),
        status: application.status().as_str().to_owned(),
        submitted_at: application.submitted_at(),
        processed_at: application.processed_at(),
        processed_by: application.processed_by().map(|id| *id.as_uuid()),
        completed_at: application.completed_at(),
        rejection_reason: application
            .rejection_reason()
            .map(|reason| reason.as_ref().to_owned()),
        notes: application.notes().map(str::to_owned),
        tracking_number: application.tracking_number().as_str().to_owned(),
        updated_at: application.updated_at(),
    }
}

fn attachment_rows(application: &Application) -> Vec<AttachmentRow> {
    application
        .attachments()
        .iter()
        .zip(0_i32..)
        .map(|(attachment, position)| AttachmentRow {
            id: *attachment.id.as_uuid(),
            application_id: *application.id().as_uuid(),
            position,
            file_name: attachment.file_name.clone(),
            file_type: attachment.file_type.as_str().to_owned(),
            file_size: i64::try_from(attachment.file_size).unwrap_or(i64::MAX),
            uploaded_at: attachment.uploaded_at,
        })
        .collect()
}

fn row_to_attachment(row: AttachmentRow) -> Result<Attachment, ApplicationPersistenceError> {
    let file_type = FileType::from_mime(&row.file_type).ok_or_else(|| {
        corrupt(
            row.application_id,
            format!("unsupported attachment type {}", row.file_type),
        )
    })?;
    let file_size = u64::try_from(row.file_size)
        .map_err(|_| corrupt(row.application_id, "negative attachment size"))?;
    Ok(Attachment {
        id: AttachmentId::from_uuid(row.id),
        file_name: row.file_name,
        file_type,
        file_size,
        uploaded_at: row.uploaded_at,
    })
}

fn row_to_application(
    row: ApplicationRow,
    attachments: Vec<Attachment>,
) -> Result<Application, ApplicationPersistenceError> {
    let id = row.id;
    let status: ApplicationStatus = row.status.parse().map_err(|err| corrupt(id, err))?;
    Application::try_from(ApplicationRecord {
        id: ApplicationId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        document_type_id: DocumentTypeId::from_uuid(row.document_type_id),
        purpose: row.purpose,
        status,
        submitted_at: row.submitted_at,
        processed_at: row.processed_at,
        processed_by: row.processed_by.map(UserId::from_uuid),
        completed_at: row.completed_at,
        rejection_reason: row.rejection_reason,
        notes: row.notes,
        attachments,
        tracking_number: row.tracking_number,
        updated_at: row.updated_at,
    })
    .map_err(|err| corrupt(id, err))
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

async fn load_attachments(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Attachment>>, ApplicationPersistenceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<AttachmentRow> = application_attachments::table
        .filter(application_attachments::application_id.eq_any(ids))
        .order_by((
            application_attachments::application_id,
            application_attachments::position,
        ))
        .select(AttachmentRow::as_select())
        .load(conn)
        .await
        .map_err(diesel_error)?;
    let mut grouped: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
    for row in rows {
        let owner = row.application_id;
        grouped.entry(owner).or_default().push(row_to_attachment(row)?);
    }
    Ok(grouped)
}

async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<ApplicationRow>,
) -> Result<Vec<Application>, ApplicationPersistenceError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut attachments = load_attachments(conn, &ids).await?;
    rows.into_iter()
        .map(|row| {
            let files = attachments.remove(&row.id).unwrap_or_default();
            row_to_application(row, files)
        })
        .collect()
}

#[async_trait]
impl ApplicationRepository for DieselApplicationRepository {
    async fn insert(&self, application: &Application) -> Result<(), ApplicationPersistenceError> {
        let row = application_to_row(application);
        let files = attachment_rows(application);
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(applications::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !files.is_empty() {
                    diesel::insert_into(application_attachments::table)
                        .values(&files)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(constraint) if constraint.contains("tracking_number") => {
                ApplicationPersistenceError::duplicate_tracking_number(
                    application.tracking_number().as_str(),
                )
            }
            _ => diesel_error(err),
        })
    }

    async fn update_status(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> Result<bool, ApplicationPersistenceError> {
        let changes = ApplicationStatusUpdate {
            status: application.status().as_str(),
            processed_at: application.processed_at(),
            processed_by: application.processed_by().map(|id| *id.as_uuid()),
            completed_at: application.completed_at(),
            rejection_reason: application.rejection_reason().map(AsRef::as_ref),
            notes: application.notes(),
            updated_at: application.updated_at(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            applications::table
                .filter(applications::id.eq(application.id().as_uuid()))
                .filter(applications::status.eq(expected.as_str())),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, ApplicationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ApplicationRow> = applications::table
            .find(id.as_uuid())
            .select(ApplicationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Application>, ApplicationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ApplicationRow> = applications::table
            .filter(applications::tracking_number.eq(tracking_number.as_str()))
            .select(ApplicationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn tracking_number_exists(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<bool, ApplicationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(diesel::dsl::exists(
            applications::table
                .filter(applications::tracking_number.eq(tracking_number.as_str())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }

    async fn list(
        &self,
        query: &ApplicationListQuery,
    ) -> Result<Vec<Application>, ApplicationPersistenceError> {
        let mut statement = applications::table
            .select(ApplicationRow::as_select())
            .into_boxed();
        if let ApplicationScope::OwnedBy(owner) = query.scope {
            statement = statement.filter(applications::user_id.eq(*owner.as_uuid()));
        }
        let filter = &query.filter;
        if let Some(status) = filter.status {
            statement = statement.filter(applications::status.eq(status.as_str()));
        }
        if let Some(document_type) = filter.document_type_id {
            statement =
                statement.filter(applications::document_type_id.eq(*document_type.as_uuid()));
        }
        if let Some(from) = filter.submitted_from {
            statement = statement.filter(applications::submitted_at.ge(from));
        }
        if let Some(to) = filter.submitted_to {
            statement = statement.filter(applications::submitted_at.le(to));
        }
        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(&term);
            statement = statement.filter(
                applications::purpose
                    .ilike(pattern.clone())
                    .or(applications::tracking_number.ilike(pattern)),
            );
        }
        if let Some(after) = query.after {
            let after_id = *after.id.as_uuid();
            statement = statement.filter(
                applications::submitted_at.lt(after.submitted_at).or(applications::submitted_at
                    .eq(after.submitted_at)
                    .and(applications::id.lt(after_id))),
            );
        }
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ApplicationRow> = statement
            .order_by((applications::submitted_at.desc(), applications::id.desc()))
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn status_counts(
        &self,
        scope: &ApplicationScope,
    ) -> Result<StatusCounts, ApplicationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let grouped: Vec<(String, i64)> = match scope {
            ApplicationScope::All => {
                applications::table
                    .group_by(applications::status)
                    .select((applications::status, count_star()))
                    .load(&mut conn)
                    .await
            }
            ApplicationScope::OwnedBy(owner) => {
                applications::table
                    .filter(applications::user_id.eq(*owner.as_uuid()))
                    .group_by(applications::status)
                    .select((applications::status, count_star()))
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(diesel_error)?;

        let mut counts = StatusCounts::default();
        for (raw, total) in grouped {
            let status: ApplicationStatus = raw
                .parse()
                .map_err(|err| ApplicationPersistenceError::corrupt(format!("{err}")))?;
            counts.record_many(status, u64::try_from(total).unwrap_or_default());
        }
        Ok(counts)
    }
}
