use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::time;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::application::dtos::bin_dto::{BinEntryDto, RestoredDocumentDto, SweepReport};
use crate::application::ports::auth_ports::{ensure_authorized, AccessGate};
use crate::application::ports::bin_ports::BinUseCase;
use crate::application::services::adapter_registry::AdapterRegistry;
use crate::common::clock::Clock;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::actor::{Actor, BinAction};
use crate::domain::entities::bin_entry::{BinEntry, CollectionName, EntryOutcome, EntryState, Snapshot};
use crate::domain::repositories::bin_repository::BinRepository;

/// Servicio de aplicación que orquesta la papelera
///
/// La entrada se confirma antes de borrar el documento de origen y sólo se
/// retira después de una reinserción correcta.
pub struct BinManager {
    bin_repository: Arc<dyn BinRepository>,
    adapters: Arc<AdapterRegistry>,
    access_gate: Arc<dyn AccessGate>,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    store_timeout: Duration,
    claims: Mutex<HashMap<Uuid, Arc<Notify>>>,
}

/// Reclamo exclusivo sobre una entrada mientras se restaura o se purga.
/// Al soltarlo se despierta a quien esperaba por la misma entrada.
struct EntryClaim<'a> {
    claims: &'a Mutex<HashMap<Uuid, Arc<Notify>>>,
    id: Uuid,
}

impl Drop for EntryClaim<'_> {
    fn drop(&mut self) {
        let mut claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(released) = claims.remove(&self.id) {
            released.notify_waiters();
        }
    }
}

impl BinManager {
    pub fn new(
        bin_repository: Arc<dyn BinRepository>,
        adapters: Arc<AdapterRegistry>,
        access_gate: Arc<dyn AccessGate>,
        clock: Arc<dyn Clock>,
        retention: chrono::Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            bin_repository,
            adapters,
            access_gate,
            clock,
            retention,
            store_timeout,
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Ejecuta una operación del almacén con timeout; agotarlo es un error `Transient`
    async fn with_store_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| DomainError::transient(
                "BinStore",
                format!("Timeout after {:?} during {}", self.store_timeout, operation),
            ))?
    }

    fn parse_entry_id(entry_id: &str) -> Result<Uuid> {
        Uuid::parse_str(entry_id)
            .map_err(|e| DomainError::invalid("BinEntry", format!("Invalid entry ID {}: {}", entry_id, e)))
    }

    /// Convierte una entidad BinEntry a un DTO
    fn to_dto(&self, entry: &BinEntry, now: DateTime<Utc>) -> BinEntryDto {
        let adapter = self.adapters.adapter(entry.collection_name());

        BinEntryDto {
            id: entry.id().to_string(),
            original_id: entry.original_id().to_string(),
            collection_name: entry.collection_name().to_string(),
            title: adapter.title(entry.snapshot()),
            description: adapter.description(entry.snapshot()),
            deleted_at: entry.deleted_at(),
            expires_at: entry.expires_at(),
            days_until_expiry: entry.days_until_expiry(now),
        }
    }

    /// Un actor sin `ListAll` sólo ve las entradas que él mismo eliminó
    fn is_visible_to(&self, entry: &BinEntry, actor: &Actor) -> bool {
        self.access_gate.authorize(actor.role, BinAction::ListAll) || entry.deleted_by() == actor.id
    }

    /// Toma el reclamo de la entrada o devuelve el aviso del reclamo vigente
    fn try_claim(&self, id: Uuid) -> std::result::Result<EntryClaim<'_>, Arc<Notify>> {
        let mut claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = claims.get(&id) {
            return Err(current.clone());
        }
        claims.insert(id, Arc::new(Notify::new()));
        Ok(EntryClaim {
            claims: &self.claims,
            id,
        })
    }

    fn is_current_claim(&self, id: &Uuid, notify: &Arc<Notify>) -> bool {
        let claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        claims.get(id).map_or(false, |current| Arc::ptr_eq(current, notify))
    }

    /// Espera, como mucho `store_timeout`, a que se libere la entrada
    async fn claim_for_restore(&self, id: Uuid) -> Result<EntryClaim<'_>> {
        let deadline = time::Instant::now() + self.store_timeout;

        loop {
            let notify = match self.try_claim(id) {
                Ok(claim) => return Ok(claim),
                Err(notify) => notify,
            };

            let released = notify.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            // El reclamo pudo soltarse antes de registrar la espera
            if !self.is_current_claim(&id, &notify) {
                continue;
            }

            debug!("Entrada {} ocupada por otra operación, esperando", id);
            if time::timeout_at(deadline, released).await.is_err() {
                return Err(DomainError::transient(
                    "BinEntry",
                    format!("Restore already in progress for {}", id),
                ));
            }
        }
    }

    /// Distingue entre una entrada que nunca existió y una que ya es terminal
    async fn missing_entry_error(&self, id: &Uuid) -> DomainError {
        match self.with_store_timeout("get_tombstone", self.bin_repository.get_tombstone(id)).await {
            Ok(Some(tombstone)) => match tombstone.outcome {
                EntryOutcome::Restored => DomainError::already_restored("BinEntry", id.to_string()),
                EntryOutcome::Purged => DomainError::already_purged("BinEntry", id.to_string()),
            },
            Ok(None) => DomainError::not_found("BinEntry", id.to_string()),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl BinUseCase for BinManager {
    #[instrument(skip(self, snapshot, actor), fields(actor = %actor.id))]
    async fn move_to_bin(
        &self,
        collection: CollectionName,
        original_id: &str,
        snapshot: Snapshot,
        actor: &Actor,
    ) -> Result<BinEntryDto> {
        info!("Moviendo a papelera: colección={}, id={}, actor={}", collection, original_id, actor.id);

        ensure_authorized(self.access_gate.as_ref(), actor, BinAction::MoveToBin)?;
        snapshot.ensure_matches(collection, original_id)?;

        let now = self.clock.now();
        let entry = BinEntry::new(
            original_id.to_string(),
            collection,
            snapshot,
            actor.id.clone(),
            now,
            self.retention,
        );

        // Primero se confirma la entrada; el documento de origen sólo se borra después
        self.with_store_timeout("insert_active", self.bin_repository.insert_active(&entry)).await?;

        let adapter = self.adapters.adapter(collection);
        if let Err(e) = adapter.remove(original_id).await {
            warn!("No se pudo eliminar {}/{} del almacén nativo, deshaciendo entrada {}: {}",
                  collection, original_id, entry.id(), e);
            if let Err(rollback_err) = self.with_store_timeout("rollback", self.bin_repository.rollback(&entry.id())).await {
                error!("Error deshaciendo la entrada {}: {}", entry.id(), rollback_err);
            }
            return Err(e);
        }

        debug!("Documento movido a papelera: {}/{} (entrada {})", collection, original_id, entry.id());
        Ok(self.to_dto(&entry, now))
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    async fn delete_document(&self, collection: &str, original_id: &str, actor: &Actor) -> Result<BinEntryDto> {
        ensure_authorized(self.access_gate.as_ref(), actor, BinAction::MoveToBin)?;

        let adapter = self.adapters.resolve(collection)?;
        let snapshot = adapter.capture(original_id).await?;

        self.move_to_bin(adapter.collection(), original_id, snapshot, actor).await
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    async fn list(&self, collection: Option<CollectionName>, actor: &Actor) -> Result<Vec<BinEntryDto>> {
        debug!("Listando papelera: colección={:?}, actor={}", collection, actor.id);

        ensure_authorized(self.access_gate.as_ref(), actor, BinAction::List)?;

        let mut entries = self.with_store_timeout("list_active", self.bin_repository.list_active(collection)).await?;
        entries.retain(|entry| entry.is_active() && self.is_visible_to(entry, actor));
        entries.sort_by(|a, b| {
            b.deleted_at()
                .cmp(&a.deleted_at())
                .then_with(|| a.id().cmp(&b.id()))
        });

        let now = self.clock.now();
        Ok(entries.iter().map(|entry| self.to_dto(entry, now)).collect())
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    async fn restore(&self, entry_id: &str, actor: &Actor) -> Result<RestoredDocumentDto> {
        info!("Restaurando entrada {} para actor {}", entry_id, actor.id);

        ensure_authorized(self.access_gate.as_ref(), actor, BinAction::Restore)?;
        let id = Self::parse_entry_id(entry_id)?;

        let _claim = self.claim_for_restore(id).await?;

        let entry = match self.with_store_timeout("get_entry", self.bin_repository.get_entry(&id)).await? {
            Some(entry) => entry,
            None => return Err(self.missing_entry_error(&id).await),
        };

        if !self.is_visible_to(&entry, actor) {
            return Err(DomainError::not_found("BinEntry", entry_id.to_string()));
        }

        match entry.state_at(self.clock.now()) {
            EntryState::Active => {}
            EntryState::Expired => {
                warn!("Restauración rechazada, la entrada {} expiró en {}", entry_id, entry.expires_at());
                return Err(DomainError::expired("BinEntry", entry_id.to_string()));
            }
            EntryState::Restored => return Err(self.missing_entry_error(&id).await),
        }

        let adapter = self.adapters.adapter(entry.collection_name());
        adapter.reinsert(entry.original_id(), entry.snapshot()).await
            .map_err(|e| {
                warn!("Reinserción fallida para {}/{}, la entrada {} queda intacta: {}",
                      entry.collection_name(), entry.original_id(), entry_id, e);
                e
            })?;

        let restored_at = self.clock.now();
        match self.with_store_timeout("complete_restore", self.bin_repository.complete_restore(&id, restored_at)).await? {
            Some(_) => debug!("Entrada {} retirada tras restaurar", entry_id),
            None => warn!("La entrada {} desapareció durante la restauración; el documento ya está vivo", entry_id),
        }

        Ok(RestoredDocumentDto {
            collection_name: entry.collection_name().to_string(),
            original_id: entry.original_id().to_string(),
            restored_at,
        })
    }

    #[instrument(skip(self))]
    async fn purge(&self, entry_id: &str) -> Result<()> {
        info!("Eliminando permanentemente entrada {}", entry_id);

        let id = Self::parse_entry_id(entry_id)?;
        let _claim = self.try_claim(id).map_err(|_| {
            DomainError::transient("BinEntry", format!("Restore in progress for {}, purge not applied", entry_id))
        })?;
        let now = self.clock.now();

        match self.with_store_timeout("purge", self.bin_repository.purge(&id, now, None)).await? {
            Some(entry) => debug!("Entrada purgada: {} ({}/{})", entry_id, entry.collection_name(), entry.original_id()),
            None => debug!("Entrada {} inexistente o ya purgada, nada que hacer", entry_id),
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let expired = self.with_store_timeout("list_expired", self.bin_repository.list_expired(now)).await?;

        let mut report = SweepReport {
            examined: expired.len(),
            ..SweepReport::default()
        };

        for entry in expired {
            let id = entry.id();

            let _claim = match self.try_claim(id) {
                Ok(claim) => claim,
                Err(_) => {
                    debug!("Restauración en curso para {}, se omite en este ciclo", id);
                    report.skipped += 1;
                    continue;
                }
            };

            match self.with_store_timeout("purge", self.bin_repository.purge(&id, now, Some(now))).await {
                Ok(Some(_)) => {
                    debug!("Entrada expirada purgada: {}", id);
                    report.purged += 1;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    // Se reintenta en el siguiente ciclo
                    error!("Error purgando entrada expirada {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        match self.with_store_timeout("prune_tombstones", self.bin_repository.prune_tombstones(now - self.retention)).await {
            Ok(pruned) => report.tombstones_pruned = pruned,
            Err(e) => error!("Error depurando lápidas antiguas: {}", e),
        }

        if report.examined > 0 {
            info!("Barrido de papelera: {} expiradas, {} purgadas, {} omitidas, {} fallidas",
                  report.examined, report.purged, report.skipped, report.failed);
        }

        Ok(report)
    }
}
