use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::common::config::TimeoutConfig;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::document::BinDocument;
use crate::domain::repositories::document_repository::DocumentRepository;

/// Almacén nativo de documentos en un archivo JSON por colección
///
/// Sustituye al almacén real de cada módulo de negocio cuando el servicio se
/// ejecuta de forma autónoma.
pub struct DocumentFsRepository<D: BinDocument> {
    path: PathBuf,
    write_lock: Mutex<()>,
    timeouts: TimeoutConfig,
    _document: PhantomData<fn() -> D>,
}

impl<D: BinDocument> DocumentFsRepository<D> {
    pub fn new(storage_root: impl AsRef<Path>, timeouts: TimeoutConfig) -> Self {
        let path = storage_root
            .as_ref()
            .join("documents")
            .join(format!("{}.json", D::COLLECTION));

        Self {
            path,
            write_lock: Mutex::new(()),
            timeouts,
            _document: PhantomData,
        }
    }

    async fn lock_for_write(&self) -> Result<MutexGuard<'_, ()>> {
        time::timeout(self.timeouts.lock_timeout(), self.write_lock.lock())
            .await
            .map_err(|_| DomainError::transient("Document", format!("Timeout acquiring lock for {}", D::COLLECTION)))
    }

    async fn load(&self) -> Result<BTreeMap<String, D>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let documents: Vec<D> = serde_json::from_str(&content)
            .map_err(|e| DomainError::internal_error(
                "Document",
                format!("Failed to parse {}: {}", self.path.display(), e),
            ))?;

        Ok(documents
            .into_iter()
            .map(|doc| (doc.id().to_string(), doc))
            .collect())
    }

    async fn store(&self, documents: &BTreeMap<String, D>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let list: Vec<&D> = documents.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        // Escribir a un archivo temporal primero para evitar corrupción
        let temp_path = self.path.with_extension(format!("{}.json.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl<D: BinDocument> DocumentRepository<D> for DocumentFsRepository<D> {
    async fn get(&self, id: &str) -> Result<Option<D>> {
        Ok(self.load().await?.remove(id))
    }

    #[instrument(skip(self, document), fields(collection = %D::COLLECTION))]
    async fn insert_new(&self, document: D) -> Result<()> {
        let _guard = self.lock_for_write().await?;
        let mut documents = self.load().await?;

        let id = document.id().to_string();
        if documents.contains_key(&id) {
            return Err(DomainError::conflict("Document", format!("{}/{}", D::COLLECTION, id)));
        }

        documents.insert(id, document);
        self.store(&documents).await
    }

    async fn save(&self, document: D) -> Result<()> {
        let _guard = self.lock_for_write().await?;
        let mut documents = self.load().await?;

        documents.insert(document.id().to_string(), document);
        self.store(&documents).await
    }

    #[instrument(skip(self), fields(collection = %D::COLLECTION))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock_for_write().await?;
        let mut documents = self.load().await?;

        if documents.remove(id).is_none() {
            return Ok(false);
        }

        self.store(&documents).await?;
        debug!("Documento eliminado: {}/{}", D::COLLECTION, id);
        Ok(true)
    }
}
