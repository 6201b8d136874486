use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::application::ports::collection_ports::CollectionAdapter;
use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::entities::announcement::Announcement;
use crate::domain::entities::bin_entry::{CollectionName, Snapshot};
use crate::domain::entities::document::BinDocument;
use crate::domain::entities::sop::Sop;
use crate::domain::entities::team_batch::TeamBatch;
use crate::domain::repositories::document_repository::DocumentRepository;

/// Adaptador de colección para cualquier tipo `BinDocument`
///
/// Cada tipo de documento obtiene su propia instancia monomórfica; el
/// esquema concreto sólo se conoce aquí.
pub struct DocumentCollectionAdapter<D: BinDocument> {
    repository: Arc<dyn DocumentRepository<D>>,
    _document: PhantomData<fn() -> D>,
}

pub type SopAdapter = DocumentCollectionAdapter<Sop>;
pub type TeamBatchAdapter = DocumentCollectionAdapter<TeamBatch>;
pub type AnnouncementAdapter = DocumentCollectionAdapter<Announcement>;

impl<D: BinDocument> DocumentCollectionAdapter<D> {
    pub fn new(repository: Arc<dyn DocumentRepository<D>>) -> Self {
        Self {
            repository,
            _document: PhantomData,
        }
    }
}

#[async_trait]
impl<D: BinDocument> CollectionAdapter for DocumentCollectionAdapter<D> {
    fn collection(&self) -> CollectionName {
        D::COLLECTION
    }

    #[instrument(skip(self), fields(collection = %D::COLLECTION))]
    async fn capture(&self, original_id: &str) -> Result<Snapshot> {
        let document = self.repository.get(original_id).await?
            .ok_or_else(|| DomainError::not_found("Document", format!("{}/{}", D::COLLECTION, original_id)))?;

        document.to_snapshot()
    }

    #[instrument(skip(self), fields(collection = %D::COLLECTION))]
    async fn remove(&self, original_id: &str) -> Result<()> {
        if self.repository.delete(original_id).await? {
            debug!("Documento eliminado de su almacén nativo: {}/{}", D::COLLECTION, original_id);
            Ok(())
        } else {
            Err(DomainError::not_found("Document", format!("{}/{}", D::COLLECTION, original_id)))
        }
    }

    #[instrument(skip(self, snapshot), fields(collection = %D::COLLECTION))]
    async fn reinsert(&self, original_id: &str, snapshot: &Snapshot) -> Result<()> {
        snapshot.ensure_matches(D::COLLECTION, original_id)?;
        let document = D::from_snapshot(snapshot)?;

        self.repository.insert_new(document).await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => DomainError::conflict("Document", format!("{}/{}", D::COLLECTION, original_id)),
                _ => e,
            })?;

        debug!("Documento reinsertado en su identidad original: {}/{}", D::COLLECTION, original_id);
        Ok(())
    }
}
