use std::sync::Arc;

use crate::application::ports::collection_ports::CollectionAdapter;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::bin_entry::CollectionName;

/// Tabla cerrada `CollectionName` → adaptador
///
/// Hay un campo por variante y la resolución es un `match` exhaustivo, así
/// que añadir un tipo de documento obliga a registrar su adaptador.
pub struct AdapterRegistry {
    sops: Arc<dyn CollectionAdapter>,
    team_batches: Arc<dyn CollectionAdapter>,
    announcements: Arc<dyn CollectionAdapter>,
}

impl AdapterRegistry {
    pub fn new(
        sops: Arc<dyn CollectionAdapter>,
        team_batches: Arc<dyn CollectionAdapter>,
        announcements: Arc<dyn CollectionAdapter>,
    ) -> Result<Self> {
        let registry = Self {
            sops,
            team_batches,
            announcements,
        };

        // Cada adaptador debe atender exactamente la colección de su campo
        for collection in CollectionName::ALL {
            let served = registry.adapter(collection).collection();
            if served != collection {
                return Err(DomainError::invalid(
                    "AdapterRegistry",
                    format!("Adapter for {} serves {}", collection, served),
                ));
            }
        }

        Ok(registry)
    }

    pub fn adapter(&self, collection: CollectionName) -> &Arc<dyn CollectionAdapter> {
        match collection {
            CollectionName::Sops => &self.sops,
            CollectionName::TeamBatches => &self.team_batches,
            CollectionName::Announcements => &self.announcements,
        }
    }

    /// Resuelve un nombre de colección recibido del exterior
    pub fn resolve(&self, collection_name: &str) -> Result<&Arc<dyn CollectionAdapter>> {
        let collection: CollectionName = collection_name.parse()?;
        Ok(self.adapter(collection))
    }
}
