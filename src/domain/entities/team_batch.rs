use serde::{Deserialize, Serialize};

use crate::domain::entities::bin_entry::CollectionName;
use crate::domain::entities::document::BinDocument;

/// Lote de trabajo asignado a un equipo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBatch {
    pub id: String,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BinDocument for TeamBatch {
    const COLLECTION: CollectionName = CollectionName::TeamBatches;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn description(&self) -> Option<String> {
        if self.team.is_empty() {
            return self.notes.clone();
        }
        Some(format!("{} ({} members)", self.team, self.members.len()))
    }
}
