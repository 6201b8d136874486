use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::common::errors::Result;
use crate::domain::entities::bin_entry::{BinEntry, CollectionName, Tombstone};

/// Almacén durable de entradas de papelera
///
/// Es el único componente que lee y escribe entradas. Las transiciones
/// terminales son atómicas: quitan la entrada activa y registran su lápida
/// en un solo paso, o no hacen nada.
#[async_trait]
pub trait BinRepository: Send + Sync {
    /// Inserta una entrada activa. Falla con `Conflict` si ya existe una entrada
    /// activa para el mismo `(collection_name, original_id)`.
    async fn insert_active(&self, entry: &BinEntry) -> Result<()>;

    async fn get_entry(&self, id: &Uuid) -> Result<Option<BinEntry>>;

    /// Entradas activas, opcionalmente filtradas por colección
    async fn list_active(&self, collection: Option<CollectionName>) -> Result<Vec<BinEntry>>;

    /// Entradas activas con `expires_at <= now`
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<BinEntry>>;

    /// Quita la entrada activa y registra la lápida `Restored`.
    /// Devuelve `None` si la entrada ya no estaba activa.
    async fn complete_restore(&self, id: &Uuid, at: DateTime<Utc>) -> Result<Option<BinEntry>>;

    /// Elimina la entrada y su snapshot, registrando la lápida `Purged`.
    /// Con `expired_by` sólo actúa si `expires_at <= expired_by`.
    async fn purge(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
        expired_by: Option<DateTime<Utc>>,
    ) -> Result<Option<BinEntry>>;

    /// Deshace una inserción cuyo documento de origen no pudo eliminarse; no deja lápida
    async fn rollback(&self, id: &Uuid) -> Result<()>;

    async fn get_tombstone(&self, id: &Uuid) -> Result<Option<Tombstone>>;

    /// Elimina lápidas anteriores a `older_than`; devuelve cuántas se borraron
    async fn prune_tombstones(&self, older_than: DateTime<Utc>) -> Result<usize>;
}
