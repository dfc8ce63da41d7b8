//! Port for the document catalogue.

use async_trait::async_trait;

use crate::domain::{DocumentType, DocumentTypeId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document type repository adapters.
    pub enum DocumentTypePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "document type repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "document type repository query failed: {message}",
    }
}

/// Port for reading the catalogue and seeding it at startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentTypeRepository: Send + Sync {
    /// Active document types ordered by name.
    async fn list_active(&self) -> Result<Vec<DocumentType>, DocumentTypePersistenceError>;

    /// Fetch one document type, active or not.
    async fn find_by_id(
        &self,
        id: &DocumentTypeId,
    ) -> Result<Option<DocumentType>, DocumentTypePersistenceError>;

    /// Insert or refresh catalogue entries.
    async fn upsert(&self, types: &[DocumentType]) -> Result<(), DocumentTypePersistenceError>;
}
