use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::document::BinDocument;

/// Almacén nativo de un tipo de documento
#[async_trait]
pub trait DocumentRepository<D: BinDocument>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<D>>;

    /// Inserta un documento nuevo; falla con `Conflict` si el id ya está ocupado
    async fn insert_new(&self, document: D) -> Result<()>;

    /// Crea o reemplaza un documento
    async fn save(&self, document: D) -> Result<()>;

    /// Devuelve `false` si el documento no existía
    async fn delete(&self, id: &str) -> Result<bool>;
}
