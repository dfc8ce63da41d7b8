//! PostgreSQL-backed `DocumentTypeRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{DocumentTypePersistenceError, DocumentTypeRepository};
use crate::domain::{DocumentType, DocumentTypeDraft, DocumentTypeId, Fee};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::DocumentTypeRow;
use super::pool::{DbPool, PoolError};
use super::schema::document_types;

/// Diesel-backed document catalogue.
#[derive(Clone)]
pub struct DieselDocumentTypeRepository {
    pool: DbPool,
}

impl DieselDocumentTypeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> DocumentTypePersistenceError {
    map_pool_error(error, DocumentTypePersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> DocumentTypePersistenceError {
    map_diesel_error(
        error,
        DocumentTypePersistenceError::query,
        DocumentTypePersistenceError::connection,
    )
}

fn row_to_document_type(row: DocumentTypeRow) -> Result<DocumentType, String> {
    let id = row.id;
    let fee = Fee::try_from_centavos(row.fee_centavos).map_err(|err| err.to_string())?;
    DocumentType::try_from(DocumentTypeDraft {
        id: DocumentTypeId::from_uuid(row.id),
        name: row.name,
        description: row.description,
        requirements: row.requirements,
        fee,
        processing_time: row.processing_time,
        is_active: row.is_active,
    })
    .map_err(|err| format!("document type {id}: {err}"))
}

fn document_type_to_row(doc: &DocumentType) -> DocumentTypeRow {
    DocumentTypeRow {
        id: *doc.id().as_uuid(),
        name: doc.name().to_owned(),
        description: doc.description().to_owned(),
        requirements: doc.requirements().to_vec(),
        fee_centavos: i64::from(doc.fee().centavos()),
        processing_time: doc.processing_time().to_owned(),
        is_active: doc.is_active(),
    }
}

#[async_trait]
impl DocumentTypeRepository for DieselDocumentTypeRepository {
    async fn list_active(&self) -> Result<Vec<DocumentType>, DocumentTypePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<DocumentTypeRow> = document_types::table
            .filter(document_types::is_active.eq(true))
            .order_by(document_types::name.asc())
            .select(DocumentTypeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        // One bad catalogue row should not hide the others.
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row_to_document_type(row)
                    .inspect_err(|message| warn!(%message, "skipping invalid document type"))
                    .ok()
            })
            .collect())
    }

    async fn find_by_id(
        &self,
        id: &DocumentTypeId,
    ) -> Result<Option<DocumentType>, DocumentTypePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<DocumentTypeRow> = document_types::table
            .find(id.as_uuid())
            .select(DocumentTypeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_document_type)
            .transpose()
            .map_err(DocumentTypePersistenceError::query)
    }

    async fn upsert(&self, types: &[DocumentType]) -> Result<(), DocumentTypePersistenceError> {
        if types.is_empty() {
            return Ok(());
        }
        let rows: Vec<DocumentTypeRow> = types.iter().map(document_type_to_row).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(document_types::table)
            .values(&rows)
            .on_conflict(document_types::id)
            .do_update()
            .set((
                document_types::name.eq(excluded(document_types::name)),
                document_types::description.eq(excluded(document_types::description)),
                document_types::requirements.eq(excluded(document_types::requirements)),
                document_types::fee_centavos.eq(excluded(document_types::fee_centavos)),
                document_types::processing_time.eq(excluded(document_types::processing_time)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}
