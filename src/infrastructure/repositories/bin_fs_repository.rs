use std::path::{Path, PathBuf};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time;
use uuid::Uuid;
use tracing::{debug, error, instrument};

use crate::common::config::TimeoutConfig;
use crate::common::errors::{Result, DomainError, ErrorKind};
use crate::domain::entities::bin_entry::{BinEntry, CollectionName, EntryOutcome, Snapshot, Tombstone};
use crate::domain::repositories::bin_repository::BinRepository;

/// Estructura para almacenar entradas de la papelera en formato JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinEntryRecord {
    id: String,
    original_id: String,
    collection_name: String,
    snapshot: serde_json::Value,
    deleted_at: String,
    expires_at: String,
    deleted_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TombstoneRecord {
    entry_id: String,
    collection_name: String,
    original_id: String,
    outcome: String,
    at: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BinIndex {
    #[serde(default)]
    entries: Vec<BinEntryRecord>,
    #[serde(default)]
    tombstones: Vec<TombstoneRecord>,
}

/// Implementación del almacén de papelera usando un índice JSON en disco
///
/// Toda lectura-modificación-escritura ocurre bajo un único mutex, lo que
/// hace atómicas la comprobación de unicidad y las transiciones terminales.
/// El índice se escribe en un archivo temporal y se renombra.
pub struct BinFsRepository {
    bin_dir: PathBuf,
    index_path: PathBuf,
    write_lock: Mutex<()>,
    timeouts: TimeoutConfig,
}

impl BinFsRepository {
    pub fn new(storage_root: impl AsRef<Path>, timeouts: TimeoutConfig) -> Self {
        let bin_dir = storage_root.as_ref().join(".bin");
        let index_path = bin_dir.join("bin_index.json");

        Self {
            bin_dir,
            index_path,
            write_lock: Mutex::new(()),
            timeouts,
        }
    }

    /// Asegura que existe el directorio de la papelera
    async fn ensure_bin_dir(&self) -> Result<()> {
        if !self.bin_dir.exists() {
            fs::create_dir_all(&self.bin_dir).await
                .map_err(|e| DomainError::new(
                    ErrorKind::InternalError,
                    "BinStore",
                    format!("Failed to create bin directory: {}", e)
                ))?;
        }

        Ok(())
    }

    async fn lock_for_write(&self) -> Result<MutexGuard<'_, ()>> {
        time::timeout(self.timeouts.lock_timeout(), self.write_lock.lock())
            .await
            .map_err(|_| DomainError::transient("BinStore", "Timeout acquiring bin index lock"))
    }

    /// Lee el índice completo
    async fn load_index(&self) -> Result<BinIndex> {
        if !self.index_path.exists() {
            return Ok(BinIndex::default());
        }

        let content = fs::read_to_string(&self.index_path).await
            .map_err(|e| DomainError::new(
                ErrorKind::InternalError,
                "BinStore",
                format!("Failed to read bin index: {}", e)
            ))?;

        if content.trim().is_empty() {
            return Ok(BinIndex::default());
        }

        serde_json::from_str(&content)
            .map_err(|e| DomainError::new(
                ErrorKind::InternalError,
                "BinStore",
                format!("Failed to parse bin index: {}", e)
            ))
    }

    /// Guarda el índice completo de forma atómica
    async fn save_index(&self, index: &BinIndex) -> Result<()> {
        self.ensure_bin_dir().await?;

        let json = serde_json::to_string_pretty(index)
            .map_err(|e| DomainError::new(
                ErrorKind::InternalError,
                "BinStore",
                format!("Failed to serialize bin index: {}", e)
            ))?;

        // Temporal propio de cada escritura: una escritura abandonada por
        // timeout no puede pisar el temporal de la siguiente
        let temp_path = self.temp_index_path();
        if let Err(e) = fs::write(&temp_path, json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(DomainError::internal_error("BinStore", format!("Failed to write bin index: {}", e)));
        }

        if let Err(e) = fs::rename(&temp_path, &self.index_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(DomainError::internal_error("BinStore", format!("Failed to replace bin index: {}", e)));
        }

        Ok(())
    }

    fn temp_index_path(&self) -> PathBuf {
        self.bin_dir.join(format!("bin_index.{}.json.tmp", Uuid::new_v4().simple()))
    }

    fn parse_date(value: &str, field: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|e| DomainError::invalid("BinStore", format!("Invalid {}: {}", field, e)))
    }

    /// Convierte un registro JSON a entidad BinEntry
    fn record_to_entry(record: &BinEntryRecord) -> Result<BinEntry> {
        let id = Uuid::parse_str(&record.id)
            .map_err(|e| DomainError::invalid("BinStore", format!("Invalid ID format: {}", e)))?;
        let collection_name: CollectionName = record.collection_name.parse()?;
        let snapshot: Snapshot = serde_json::from_value(record.snapshot.clone())
            .map_err(|e| DomainError::invalid("BinStore", format!("Invalid snapshot for {}: {}", record.id, e)))?;

        Ok(BinEntry::from_parts(
            id,
            record.original_id.clone(),
            collection_name,
            snapshot,
            Self::parse_date(&record.deleted_at, "deleted_at")?,
            Self::parse_date(&record.expires_at, "expires_at")?,
            record.deleted_by.clone(),
            None,
        ))
    }

    /// Convierte una entidad BinEntry a registro JSON
    fn entry_to_record(entry: &BinEntry) -> Result<BinEntryRecord> {
        Ok(BinEntryRecord {
            id: entry.id().to_string(),
            original_id: entry.original_id().to_string(),
            collection_name: entry.collection_name().to_string(),
            snapshot: serde_json::to_value(entry.snapshot())?,
            deleted_at: entry.deleted_at().to_rfc3339(),
            expires_at: entry.expires_at().to_rfc3339(),
            deleted_by: entry.deleted_by().to_string(),
        })
    }

    fn tombstone_to_record(tombstone: &Tombstone) -> TombstoneRecord {
        TombstoneRecord {
            entry_id: tombstone.entry_id.to_string(),
            collection_name: tombstone.collection_name.to_string(),
            original_id: tombstone.original_id.clone(),
            outcome: tombstone.outcome.as_str().to_string(),
            at: tombstone.at.to_rfc3339(),
        }
    }

    fn record_to_tombstone(record: &TombstoneRecord) -> Result<Tombstone> {
        Ok(Tombstone {
            entry_id: Uuid::parse_str(&record.entry_id)
                .map_err(|e| DomainError::invalid("BinStore", format!("Invalid tombstone ID: {}", e)))?,
            collection_name: record.collection_name.parse()?,
            original_id: record.original_id.clone(),
            outcome: record.outcome.parse()?,
            at: Self::parse_date(&record.at, "tombstone at")?,
        })
    }

    /// Convierte registros ignorando (y registrando) los corruptos
    fn records_to_entries<'a>(records: impl Iterator<Item = &'a BinEntryRecord>) -> Vec<BinEntry> {
        let mut entries = Vec::new();
        for record in records {
            match Self::record_to_entry(record) {
                Ok(entry) => entries.push(entry),
                Err(e) => error!("Error converting bin record {}: {}", record.id, e),
            }
        }
        entries
    }

    /// Quita una entrada del índice y registra su lápida, si la condición se cumple
    async fn finish_entry(
        &self,
        id: &Uuid,
        outcome: EntryOutcome,
        at: DateTime<Utc>,
        expired_by: Option<DateTime<Utc>>,
    ) -> Result<Option<BinEntry>> {
        let _guard = self.lock_for_write().await?;
        let mut index = self.load_index().await?;

        let id_str = id.to_string();
        let Some(position) = index.entries.iter().position(|record| record.id == id_str) else {
            return Ok(None);
        };

        let entry = Self::record_to_entry(&index.entries[position])?;
        if let Some(limit) = expired_by {
            if entry.expires_at() > limit {
                return Ok(None);
            }
        }

        index.entries.remove(position);
        index.tombstones.retain(|record| record.entry_id != id_str);
        index.tombstones.push(Self::tombstone_to_record(&Tombstone::for_entry(&entry, outcome, at)));
        self.save_index(&index).await?;

        Ok(Some(entry))
    }
}

#[async_trait]
impl BinRepository for BinFsRepository {
    #[instrument(skip(self, entry), fields(entry_id = %entry.id()))]
    async fn insert_active(&self, entry: &BinEntry) -> Result<()> {
        debug!("Añadiendo entrada a la papelera: {}/{}", entry.collection_name(), entry.original_id());

        let _guard = self.lock_for_write().await?;
        let mut index = self.load_index().await?;

        let collection = entry.collection_name().to_string();
        let duplicate = index.entries.iter().any(|record| {
            record.collection_name == collection && record.original_id == entry.original_id()
        });
        if duplicate {
            return Err(DomainError::conflict(
                "BinEntry",
                format!("{}/{}", entry.collection_name(), entry.original_id()),
            ));
        }

        index.entries.push(Self::entry_to_record(entry)?);
        self.save_index(&index).await
    }

    #[instrument(skip(self))]
    async fn get_entry(&self, id: &Uuid) -> Result<Option<BinEntry>> {
        let index = self.load_index().await?;
        let id_str = id.to_string();

        index.entries.iter()
            .find(|record| record.id == id_str)
            .map(Self::record_to_entry)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_active(&self, collection: Option<CollectionName>) -> Result<Vec<BinEntry>> {
        let index = self.load_index().await?;
        let filter = collection.map(|c| c.to_string());

        Ok(Self::records_to_entries(
            index.entries.iter()
                .filter(|record| filter.as_ref().map_or(true, |c| &record.collection_name == c)),
        ))
    }

    #[instrument(skip(self))]
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<BinEntry>> {
        debug!("Buscando entradas de papelera expiradas");

        let index = self.load_index().await?;
        Ok(Self::records_to_entries(index.entries.iter())
            .into_iter()
            .filter(|entry| entry.expires_at() <= now)
            .collect())
    }

    #[instrument(skip(self))]
    async fn complete_restore(&self, id: &Uuid, at: DateTime<Utc>) -> Result<Option<BinEntry>> {
        debug!("Retirando entrada restaurada: {}", id);

        Ok(self.finish_entry(id, EntryOutcome::Restored, at, None).await?
            .map(|entry| entry.into_restored(at)))
    }

    #[instrument(skip(self))]
    async fn purge(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
        expired_by: Option<DateTime<Utc>>,
    ) -> Result<Option<BinEntry>> {
        debug!("Purgando entrada de la papelera: {}", id);

        self.finish_entry(id, EntryOutcome::Purged, at, expired_by).await
    }

    #[instrument(skip(self))]
    async fn rollback(&self, id: &Uuid) -> Result<()> {
        let _guard = self.lock_for_write().await?;
        let mut index = self.load_index().await?;

        let id_str = id.to_string();
        let before = index.entries.len();
        index.entries.retain(|record| record.id != id_str);

        if index.entries.len() != before {
            self.save_index(&index).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_tombstone(&self, id: &Uuid) -> Result<Option<Tombstone>> {
        let index = self.load_index().await?;
        let id_str = id.to_string();

        index.tombstones.iter()
            .find(|record| record.entry_id == id_str)
            .map(Self::record_to_tombstone)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn prune_tombstones(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let _guard = self.lock_for_write().await?;
        let mut index = self.load_index().await?;

        let before = index.tombstones.len();
        index.tombstones.retain(|record| match Self::parse_date(&record.at, "tombstone at") {
            Ok(at) => at >= older_than,
            Err(_) => false,
        });

        let pruned = before - index.tombstones.len();
        if pruned > 0 {
            self.save_index(&index).await?;
        }
        Ok(pruned)
    }
}
