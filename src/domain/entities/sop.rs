use serde::{Deserialize, Serialize};

use crate::domain::entities::bin_entry::{AttachmentRef, CollectionName};
use crate::domain::entities::document::BinDocument;

/// Procedimiento operativo estándar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sop {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub owner: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub revision: u32,
}

impl BinDocument for Sop {
    const COLLECTION: CollectionName = CollectionName::Sops;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn description(&self) -> Option<String> {
        self.summary
            .clone()
            .or_else(|| self.steps.first().cloned())
    }

    fn attachments(&self) -> Vec<AttachmentRef> {
        self.attachments.clone()
    }
}
