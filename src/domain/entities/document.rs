use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::bin_entry::{AttachmentRef, CollectionName, Snapshot};

/// Documento de negocio que puede enviarse a la papelera
///
/// Cada tipo declara su colección y cómo extraer los metadatos que se
/// muestran en el listado de la papelera.
pub trait BinDocument: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: CollectionName;

    fn id(&self) -> &str;

    fn title(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    fn attachments(&self) -> Vec<AttachmentRef> {
        Vec::new()
    }

    /// Serializa el documento completo en un snapshot opaco
    fn to_snapshot(&self) -> Result<Snapshot> {
        let document = serde_json::to_value(self)
            .map_err(|e| DomainError::invalid("Snapshot", format!("Failed to serialize document {}: {}", self.id(), e)))?;

        Ok(Snapshot {
            kind: Self::COLLECTION,
            original_id: self.id().to_string(),
            title: self.title().filter(|t| !t.trim().is_empty()),
            description: self.description().filter(|d| !d.trim().is_empty()),
            attachments: self.attachments(),
            document,
        })
    }

    /// Reconstruye el documento a partir de un snapshot de su misma colección
    fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        snapshot.ensure_matches(Self::COLLECTION, &snapshot.original_id)?;

        let document: Self = serde_json::from_value(snapshot.document.clone())
            .map_err(|e| DomainError::invalid(
                "Snapshot",
                format!("Malformed {} snapshot for {}: {}", Self::COLLECTION, snapshot.original_id, e),
            ))?;

        if document.id() != snapshot.original_id {
            return Err(DomainError::invalid(
                "Snapshot",
                format!("Snapshot payload id {} does not match {}", document.id(), snapshot.original_id),
            ));
        }

        Ok(document)
    }
}
