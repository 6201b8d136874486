use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::bin_entry::{CollectionName, Snapshot};

/// Capacidad que cada tipo de documento implementa para participar en la papelera
#[async_trait]
pub trait CollectionAdapter: Send + Sync + 'static {
    /// Colección atendida por este adaptador
    fn collection(&self) -> CollectionName;

    /// Lee el documento vivo y lo serializa en un snapshot opaco
    async fn capture(&self, original_id: &str) -> Result<Snapshot>;

    /// Elimina el documento vivo de su almacén nativo
    async fn remove(&self, original_id: &str) -> Result<()>;

    /// Recrea el documento en su identidad original.
    /// Falla con `Conflict` si esa identidad ya está ocupada.
    async fn reinsert(&self, original_id: &str, snapshot: &Snapshot) -> Result<()>;

    fn title(&self, snapshot: &Snapshot) -> String {
        snapshot
            .title
            .clone()
            .unwrap_or_else(|| snapshot.fallback_label())
    }

    fn description(&self, snapshot: &Snapshot) -> String {
        snapshot
            .description
            .clone()
            .unwrap_or_else(|| snapshot.fallback_label())
    }
}
