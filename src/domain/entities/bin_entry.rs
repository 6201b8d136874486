use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::errors::{DomainError, Result};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Tipos de documento que pueden enviarse a la papelera
///
/// El conjunto es cerrado: cada variante tiene exactamente un adaptador
/// registrado en `AdapterRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionName {
    Sops,
    TeamBatches,
    Announcements,
}

impl CollectionName {
    pub const ALL: [CollectionName; 3] = [
        CollectionName::Sops,
        CollectionName::TeamBatches,
        CollectionName::Announcements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Sops => "sops",
            CollectionName::TeamBatches => "team_batches",
            CollectionName::Announcements => "announcements",
        }
    }

    /// Nombre legible del tipo de documento, usado en títulos genéricos
    pub fn kind_label(&self) -> &'static str {
        match self {
            CollectionName::Sops => "SOP",
            CollectionName::TeamBatches => "Team batch",
            CollectionName::Announcements => "Announcement",
        }
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        CollectionName::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::invalid("Collection", format!("Unknown collection: {}", s)))
    }
}

/// Referencia a un blob externo (adjunto); la papelera nunca duplica el contenido
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub storage_key: String,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Copia opaca de un documento eliminado
///
/// Contiene lo necesario para listar (título, descripción) sin conocer el
/// esquema original y el documento completo para reconstruirlo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub kind: CollectionName,
    pub original_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    pub document: serde_json::Value,
}

impl Snapshot {
    /// Título genérico `"<tipo> (<prefijo del id>…)"`
    pub fn fallback_label(&self) -> String {
        let prefix: String = self.original_id.chars().take(8).collect();
        format!("{} ({}…)", self.kind.kind_label(), prefix)
    }

    /// Comprueba que el snapshot describe el documento indicado
    pub fn ensure_matches(&self, collection: CollectionName, original_id: &str) -> Result<()> {
        if self.kind != collection {
            return Err(DomainError::invalid(
                "Snapshot",
                format!("Snapshot of kind {} cannot be stored in {}", self.kind, collection),
            ));
        }
        if self.original_id != original_id {
            return Err(DomainError::invalid(
                "Snapshot",
                format!("Snapshot belongs to {} and not to {}", self.original_id, original_id),
            ));
        }
        Ok(())
    }
}

/// Estado derivado de una entrada; `Expired` nunca se persiste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Active,
    Expired,
    Restored,
}

#[derive(Debug, Clone)]
pub struct BinEntry {
    id: Uuid,
    original_id: String,
    collection_name: CollectionName,
    snapshot: Snapshot,
    deleted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>, // fijada al crear la entrada
    deleted_by: String,
    restored_at: Option<DateTime<Utc>>,
}

impl BinEntry {
    pub fn new(
        original_id: String,
        collection_name: CollectionName,
        snapshot: Snapshot,
        deleted_by: String,
        deleted_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_id,
            collection_name,
            snapshot,
            deleted_at,
            expires_at: deleted_at + retention,
            deleted_by,
            restored_at: None,
        }
    }

    /// Reconstruye una entrada leída desde el almacén
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        original_id: String,
        collection_name: CollectionName,
        snapshot: Snapshot,
        deleted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        deleted_by: String,
        restored_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            original_id,
            collection_name,
            snapshot,
            deleted_at,
            expires_at,
            deleted_by,
            restored_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    pub fn collection_name(&self) -> CollectionName {
        self.collection_name
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn deleted_at(&self) -> DateTime<Utc> {
        self.deleted_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn deleted_by(&self) -> &str {
        &self.deleted_by
    }

    pub fn restored_at(&self) -> Option<DateTime<Utc>> {
        self.restored_at
    }

    pub fn is_active(&self) -> bool {
        self.restored_at.is_none()
    }

    /// El límite es exclusivo: en `expires_at` la entrada ya no es restaurable
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> EntryState {
        if self.restored_at.is_some() {
            EntryState::Restored
        } else if self.is_expired_at(now) {
            EntryState::Expired
        } else {
            EntryState::Active
        }
    }

    /// Días completos o parciales restantes, redondeando hacia arriba y nunca negativos
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        let remaining_ms = (self.expires_at - now).num_milliseconds();
        if remaining_ms <= 0 {
            return 0;
        }
        (remaining_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }

    /// Devuelve la entrada marcada como restaurada (estado terminal)
    pub fn into_restored(mut self, at: DateTime<Utc>) -> Self {
        self.restored_at = Some(at);
        self
    }
}

/// Resultado terminal de una entrada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Restored,
    Purged,
}

impl EntryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryOutcome::Restored => "restored",
            EntryOutcome::Purged => "purged",
        }
    }
}

impl FromStr for EntryOutcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "restored" => Ok(EntryOutcome::Restored),
            "purged" => Ok(EntryOutcome::Purged),
            other => Err(DomainError::invalid("Tombstone", format!("Unknown outcome: {}", other))),
        }
    }
}

/// Registro sin snapshot de una entrada que ya alcanzó un estado terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub entry_id: Uuid,
    pub collection_name: CollectionName,
    pub original_id: String,
    pub outcome: EntryOutcome,
    pub at: DateTime<Utc>,
}

impl Tombstone {
    pub fn for_entry(entry: &BinEntry, outcome: EntryOutcome, at: DateTime<Utc>) -> Self {
        Self {
            entry_id: entry.id(),
            collection_name: entry.collection_name(),
            original_id: entry.original_id().to_string(),
            outcome,
            at,
        }
    }
}
