//! In-memory [`DocumentTypeRepository`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{DocumentTypePersistenceError, DocumentTypeRepository};
use crate::domain::{DocumentType, DocumentTypeId, default_document_types};

use super::lock;

/// Map-backed document catalogue.
#[derive(Debug, Default)]
pub struct InMemoryDocumentTypeRepository {
    types: Mutex<HashMap<DocumentTypeId, DocumentType>>,
}

impl InMemoryDocumentTypeRepository {
    /// Empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding the default barangay documents.
    pub fn seeded() -> Self {
        let types = default_document_types()
            .into_iter()
            .map(|doc| (*doc.id(), doc))
            .collect();
        Self {
            types: Mutex::new(types),
        }
    }
}

#[async_trait]
impl DocumentTypeRepository for InMemoryDocumentTypeRepository {
    async fn list_active(&self) -> Result<Vec<DocumentType>, DocumentTypePersistenceError> {
        let mut active: Vec<DocumentType> = lock(&self.types)
            .values()
            .filter(|doc| doc.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(active)
    }

    async fn find_by_id(
        &self,
        id: &DocumentTypeId,
    ) -> Result<Option<DocumentType>, DocumentTypePersistenceError> {
        Ok(lock(&self.types).get(id).cloned())
    }

    async fn upsert(&self, types: &[DocumentType]) -> Result<(), DocumentTypePersistenceError> {
        let mut held = lock(&self.types);
        for doc in types {
            held.insert(*doc.id(), doc.clone());
        }
        Ok(())
    }
}
