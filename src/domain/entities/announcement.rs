use serde::{Deserialize, Serialize};

use crate::domain::entities::bin_entry::CollectionName;
use crate::domain::entities::document::BinDocument;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    #[serde(default)]
    pub headline: Option<String>,
    pub body: String,
    #[serde(default)]
    pub audience: Option<String>,
}

impl BinDocument for Announcement {
    const COLLECTION: CollectionName = CollectionName::Announcements;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> Option<String> {
        self.headline.clone()
    }

    fn description(&self) -> Option<String> {
        let body = self.body.trim();
        if body.is_empty() {
            return None;
        }
        if body.chars().count() <= PREVIEW_CHARS {
            return Some(body.to_string());
        }
        let preview: String = body.chars().take(PREVIEW_CHARS).collect();
        Some(format!("{}…", preview.trim_end()))
    }
}
