use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::application::ports::auth_ports::AccessGate;
use crate::application::ports::bin_ports::BinUseCase;
use crate::application::services::adapter_registry::AdapterRegistry;
use crate::application::services::bin_manager::BinManager;
use crate::application::services::document_adapter::{AnnouncementAdapter, SopAdapter, TeamBatchAdapter};
use crate::common::clock::ManualClock;
use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::entities::actor::{Actor, BinAction, Role};
use crate::domain::entities::announcement::Announcement;
use crate::domain::entities::bin_entry::{BinEntry, CollectionName, EntryOutcome, Tombstone};
use crate::domain::entities::document::BinDocument;
use crate::domain::entities::sop::Sop;
use crate::domain::entities::team_batch::TeamBatch;
use crate::domain::repositories::bin_repository::BinRepository;
use crate::domain::repositories::document_repository::DocumentRepository;

// Mock repositories for testing
struct MockBinRepository {
    entries: Mutex<HashMap<Uuid, BinEntry>>,
    tombstones: Mutex<HashMap<Uuid, Tombstone>>,
    delay: Mutex<Option<StdDuration>>,
    fail_purge: Mutex<bool>,
}

impl MockBinRepository {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            tombstones: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            fail_purge: Mutex::new(false),
        }
    }

    fn set_delay(&self, delay: StdDuration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn set_fail_purge(&self, fail: bool) {
        *self.fail_purge.lock().unwrap() = fail;
    }

    fn active_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn finish(&self, id: &Uuid, outcome: EntryOutcome, at: DateTime<Utc>, expired_by: Option<DateTime<Utc>>) -> Option<BinEntry> {
        let mut entries = self.entries.lock().unwrap();
        let eligible = entries
            .get(id)
            .map(|entry| expired_by.map_or(true, |now| entry.expires_at() <= now))
            .unwrap_or(false);
        if !eligible {
            return None;
        }

        let entry = entries.remove(id)?;
        self.tombstones
            .lock()
            .unwrap()
            .insert(*id, Tombstone::for_entry(&entry, outcome, at));
        Some(entry)
    }
}

#[async_trait]
impl BinRepository for MockBinRepository {
    async fn insert_active(&self, entry: &BinEntry) -> Result<()> {
        self.maybe_delay().await;
        let mut entries = self.entries.lock().unwrap();
        let duplicate = entries.values().any(|e| {
            e.collection_name() == entry.collection_name() && e.original_id() == entry.original_id()
        });
        if duplicate {
            return Err(DomainError::conflict("BinEntry", entry.original_id()));
        }
        entries.insert(entry.id(), entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: &Uuid) -> Result<Option<BinEntry>> {
        self.maybe_delay().await;
        Ok(self.entries.lock().unwrap().get(id).cloned())
    }

    async fn list_active(&self, collection: Option<CollectionName>) -> Result<Vec<BinEntry>> {
        self.maybe_delay().await;
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .values()
            .filter(|e| collection.map_or(true, |c| e.collection_name() == c))
            .cloned()
            .collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<BinEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.values().filter(|e| e.expires_at() <= now).cloned().collect())
    }

    async fn complete_restore(&self, id: &Uuid, at: DateTime<Utc>) -> Result<Option<BinEntry>> {
        Ok(self.finish(id, EntryOutcome::Restored, at, None).map(|e| e.into_restored(at)))
    }

    async fn purge(&self, id: &Uuid, at: DateTime<Utc>, expired_by: Option<DateTime<Utc>>) -> Result<Option<BinEntry>> {
        if *self.fail_purge.lock().unwrap() {
            return Err(DomainError::transient("BinStore", "store unavailable"));
        }
        Ok(self.finish(id, EntryOutcome::Purged, at, expired_by))
    }

    async fn rollback(&self, id: &Uuid) -> Result<()> {
        self.entries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn get_tombstone(&self, id: &Uuid) -> Result<Option<Tombstone>> {
        Ok(self.tombstones.lock().unwrap().get(id).cloned())
    }

    async fn prune_tombstones(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let mut tombstones = self.tombstones.lock().unwrap();
        let before = tombstones.len();
        tombstones.retain(|_, t| t.at >= older_than);
        Ok(before - tombstones.len())
    }
}

struct MockDocumentRepository<D: BinDocument> {
    documents: Mutex<HashMap<String, D>>,
    fail_delete: Mutex<Option<ErrorKind>>,
    insert_delay: Mutex<Option<StdDuration>>,
    fail_next_insert: Mutex<Option<ErrorKind>>,
    inserts: Mutex<usize>,
}

impl<D: BinDocument> MockDocumentRepository<D> {
    fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            fail_delete: Mutex::new(None),
            insert_delay: Mutex::new(None),
            fail_next_insert: Mutex::new(None),
            inserts: Mutex::new(0),
        }
    }

    fn set_insert_delay(&self, delay: StdDuration) {
        *self.insert_delay.lock().unwrap() = Some(delay);
    }

    fn fail_next_insert(&self, kind: ErrorKind) {
        *self.fail_next_insert.lock().unwrap() = Some(kind);
    }

    fn insert_count(&self) -> usize {
        *self.inserts.lock().unwrap()
    }

    fn contains(&self, id: &str) -> bool {
        self.documents.lock().unwrap().contains_key(id)
    }

    fn set_fail_delete(&self, kind: Option<ErrorKind>) {
        *self.fail_delete.lock().unwrap() = kind;
    }
}

#[async_trait]
impl<D: BinDocument> DocumentRepository<D> for MockDocumentRepository<D> {
    async fn get(&self, id: &str) -> Result<Option<D>> {
        Ok(self.documents.lock().unwrap().get(id).cloned())
    }

    async fn insert_new(&self, document: D) -> Result<()> {
        *self.inserts.lock().unwrap() += 1;
        let delay = *self.insert_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(kind) = self.fail_next_insert.lock().unwrap().take() {
            return Err(DomainError::new(kind, "Document", format!("insert failed for {}", document.id())));
        }

        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(document.id()) {
            return Err(DomainError::conflict("Document", document.id()));
        }
        documents.insert(document.id().to_string(), document);
        Ok(())
    }

    async fn save(&self, document: D) -> Result<()> {
        self.documents.lock().unwrap().insert(document.id().to_string(), document);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if let Some(kind) = *self.fail_delete.lock().unwrap() {
            return Err(DomainError::new(kind, "Document", format!("delete failed for {}", id)));
        }
        Ok(self.documents.lock().unwrap().remove(id).is_some())
    }
}

mock! {
    pub Gate {}

    #[async_trait]
    impl AccessGate for Gate {
        async fn authenticate(&self, token: &str) -> Result<Actor>;
        fn authorize(&self, role: Role, action: BinAction) -> bool;
    }
}

fn policy_gate() -> MockGate {
    let mut gate = MockGate::new();
    gate.expect_authorize().returning(|role, action| role.allows(action));
    gate
}

struct Fixture {
    manager: BinManager,
    bin_repository: Arc<MockBinRepository>,
    sops: Arc<MockDocumentRepository<Sop>>,
    batches: Arc<MockDocumentRepository<TeamBatch>>,
    announcements: Arc<MockDocumentRepository<Announcement>>,
    clock: Arc<ManualClock>,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn fixture_with_gate(gate: MockGate) -> Fixture {
    let bin_repository = Arc::new(MockBinRepository::new());
    let sops = Arc::new(MockDocumentRepository::<Sop>::new());
    let batches = Arc::new(MockDocumentRepository::<TeamBatch>::new());
    let announcements = Arc::new(MockDocumentRepository::<Announcement>::new());
    let clock = Arc::new(ManualClock::new(start_time()));

    let registry = AdapterRegistry::new(
        Arc::new(SopAdapter::new(sops.clone())),
        Arc::new(TeamBatchAdapter::new(batches.clone())),
        Arc::new(AnnouncementAdapter::new(announcements.clone())),
    )
    .unwrap();

    let manager = BinManager::new(
        bin_repository.clone(),
        Arc::new(registry),
        Arc::new(gate),
        clock.clone(),
        Duration::days(30),
        StdDuration::from_millis(500),
    );

    Fixture {
        manager,
        bin_repository,
        sops,
        batches,
        announcements,
        clock,
    }
}

fn fixture() -> Fixture {
    fixture_with_gate(policy_gate())
}

fn editor() -> Actor {
    Actor::new("editor-1", Role::Editor)
}

fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

fn sop(id: &str) -> Sop {
    Sop {
        id: id.to_string(),
        title: "Cold chain handling".to_string(),
        summary: Some("Keep products below 4°C".to_string()),
        steps: vec!["Check thermometer".to_string()],
        owner: "quality".to_string(),
        attachments: Vec::new(),
        revision: 3,
    }
}

fn batch(id: &str) -> TeamBatch {
    TeamBatch {
        id: id.to_string(),
        name: format!("Batch {}", id),
        team: "Warehouse".to_string(),
        members: vec!["ana".to_string(), "luis".to_string()],
        notes: None,
    }
}

#[tokio::test]
async fn test_delete_and_restore_sop() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();

    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    assert!(!f.sops.contains("abc123"));

    let listing = f.manager.list(None, &editor()).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].collection_name, "sops");
    assert_eq!(listing[0].original_id, "abc123");
    assert_eq!(listing[0].days_until_expiry, 30);
    assert_eq!(listing[0].title, "Cold chain handling");
    assert_eq!(listing[0].expires_at, listing[0].deleted_at + Duration::days(30));

    let restored = f.manager.restore(&entry.id, &editor()).await.unwrap();
    assert_eq!(restored.original_id, "abc123");
    assert_eq!(f.sops.get("abc123").await.unwrap(), Some(sop("abc123")));
    assert!(f.manager.list(None, &editor()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purged_entry_does_not_block_new_deletes() {
    let f = fixture();
    f.batches.save(batch("b1")).await.unwrap();
    f.manager.delete_document("team_batches", "b1", &editor()).await.unwrap();

    f.clock.advance(Duration::days(31));
    let report = f.manager.purge_expired().await.unwrap();
    assert_eq!(report.purged, 1);

    f.batches.save(batch("b2")).await.unwrap();
    f.manager.delete_document("team_batches", "b2", &editor()).await.unwrap();

    // El mismo id original también puede volver a la papelera
    f.batches.save(batch("b1")).await.unwrap();
    f.manager.delete_document("team_batches", "b1", &editor()).await.unwrap();
    assert_eq!(f.bin_repository.active_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_restores_admit_exactly_one() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    f.sops.set_insert_delay(StdDuration::from_millis(20));

    let actor = editor();
    let (first, second) = tokio::join!(
        f.manager.restore(&entry.id, &actor),
        f.manager.restore(&entry.id, &actor),
    );

    // La segunda llamada espera a la primera y encuentra la lápida
    assert!(first.is_ok());
    assert_eq!(second.unwrap_err().kind, ErrorKind::AlreadyRestored);
    assert_eq!(f.sops.insert_count(), 1);
    assert!(f.sops.contains("abc123"));
}

#[tokio::test(start_paused = true)]
async fn test_waiting_restore_retries_after_failed_restore() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    f.sops.set_insert_delay(StdDuration::from_millis(20));
    f.sops.fail_next_insert(ErrorKind::Transient);

    let actor = editor();
    let (first, second) = tokio::join!(
        f.manager.restore(&entry.id, &actor),
        f.manager.restore(&entry.id, &actor),
    );

    assert_eq!(first.unwrap_err().kind, ErrorKind::Transient);
    assert_eq!(second.unwrap().original_id, "abc123");
    assert_eq!(f.sops.insert_count(), 2);
    assert_eq!(f.bin_repository.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restore_waiting_too_long_is_transient() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    f.sops.set_insert_delay(StdDuration::from_secs(2));

    let actor = editor();
    let (first, second) = tokio::join!(
        f.manager.restore(&entry.id, &actor),
        f.manager.restore(&entry.id, &actor),
    );

    assert!(first.is_ok());
    let err = second.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transient);
    assert!(err.kind.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_skips_entry_with_restore_in_flight() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    let id = Uuid::parse_str(&entry.id).unwrap();

    // La restauración se valida antes de la expiración y el barrido llega después
    f.clock.advance(Duration::days(29));
    f.sops.set_insert_delay(StdDuration::from_millis(20));

    let actor = editor();
    let sweep = async {
        f.clock.advance(Duration::days(2));
        f.manager.purge_expired().await
    };
    let (restored, report) = tokio::join!(f.manager.restore(&entry.id, &actor), sweep);

    let report = report.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.purged, 0);

    assert_eq!(restored.unwrap().original_id, "abc123");
    assert!(f.sops.contains("abc123"));
    let tombstone = f.bin_repository.get_tombstone(&id).await.unwrap().unwrap();
    assert_eq!(tombstone.outcome, EntryOutcome::Restored);
}

#[tokio::test(start_paused = true)]
async fn test_purge_does_not_overtake_restore_in_flight() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    let id = Uuid::parse_str(&entry.id).unwrap();
    f.sops.set_insert_delay(StdDuration::from_millis(20));

    let actor = editor();
    let (restored, purged) = tokio::join!(
        f.manager.restore(&entry.id, &actor),
        f.manager.purge(&entry.id),
    );

    assert!(restored.is_ok());
    assert_eq!(purged.unwrap_err().kind, ErrorKind::Transient);

    // Reintentada después, la purga no tiene nada que hacer
    f.manager.purge(&entry.id).await.unwrap();
    assert!(f.sops.contains("abc123"));
    let tombstone = f.bin_repository.get_tombstone(&id).await.unwrap().unwrap();
    assert_eq!(tombstone.outcome, EntryOutcome::Restored);
}

#[tokio::test]
async fn test_sweep_purges_only_expired_entries() {
    let f = fixture();
    f.sops.save(sop("old")).await.unwrap();
    f.manager.delete_document("sops", "old", &editor()).await.unwrap();

    f.clock.advance(Duration::days(10));
    f.sops.save(sop("recent")).await.unwrap();
    f.manager.delete_document("sops", "recent", &editor()).await.unwrap();

    f.clock.advance(Duration::days(21));
    let report = f.manager.purge_expired().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.purged, 1);
    assert_eq!(report.failed, 0);

    let listing = f.manager.list(None, &editor()).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].original_id, "recent");
    assert_eq!(listing[0].days_until_expiry, 9);
}

#[tokio::test]
async fn test_restore_at_exact_expiry_is_rejected() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();

    f.clock.advance(Duration::days(30));
    let err = f.manager.restore(&entry.id, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);
    assert!(!f.sops.contains("abc123"));
    assert_eq!(f.bin_repository.active_count(), 1);
}

#[tokio::test]
async fn test_second_delete_of_same_document_conflicts() {
    let f = fixture();
    let snapshot = sop("abc123").to_snapshot().unwrap();
    f.sops.save(sop("abc123")).await.unwrap();

    f.manager
        .move_to_bin(CollectionName::Sops, "abc123", snapshot.clone(), &editor())
        .await
        .unwrap();

    let err = f.manager
        .move_to_bin(CollectionName::Sops, "abc123", snapshot, &editor())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(f.bin_repository.active_count(), 1);
}

#[tokio::test]
async fn test_reinsert_conflict_keeps_entry() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();

    // Otro documento ocupa la identidad original
    f.sops.save(sop("abc123")).await.unwrap();

    let err = f.manager.restore(&entry.id, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(f.manager.list(None, &editor()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_source_removal_rolls_back_entry() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    f.sops.set_fail_delete(Some(ErrorKind::InternalError));

    let err = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
    assert!(f.sops.contains("abc123"));
    assert_eq!(f.bin_repository.active_count(), 0);

    // La reversión no deja restos que bloqueen un nuevo intento
    f.sops.set_fail_delete(None);
    f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
}

#[tokio::test]
async fn test_transient_source_removal_rolls_back_entry() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    f.sops.set_fail_delete(Some(ErrorKind::Transient));

    let err = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transient);
    assert!(f.sops.contains("abc123"));
    assert_eq!(f.bin_repository.active_count(), 0);
    assert!(f.manager.list(None, &editor()).await.unwrap().is_empty());

    f.sops.set_fail_delete(None);
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    assert!(!f.sops.contains("abc123"));
    f.manager.restore(&entry.id, &editor()).await.unwrap();
    assert!(f.sops.contains("abc123"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_yields_transient() {
    let f = fixture();
    f.bin_repository.set_delay(StdDuration::from_secs(10));

    let err = f.manager.list(None, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transient);
    assert!(err.kind.is_retryable());
}

#[tokio::test]
async fn test_purge_twice_is_noop() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();

    f.manager.purge(&entry.id).await.unwrap();
    f.manager.purge(&entry.id).await.unwrap();
    f.manager.purge(&Uuid::new_v4().to_string()).await.unwrap();

    assert_eq!(f.bin_repository.active_count(), 0);
    assert!(!f.sops.contains("abc123"));
}

#[tokio::test]
async fn test_terminal_entries_report_their_outcome() {
    let f = fixture();
    f.sops.save(sop("restored")).await.unwrap();
    f.sops.save(sop("purged")).await.unwrap();
    let restored = f.manager.delete_document("sops", "restored", &editor()).await.unwrap();
    let purged = f.manager.delete_document("sops", "purged", &editor()).await.unwrap();

    f.manager.restore(&restored.id, &editor()).await.unwrap();
    f.manager.purge(&purged.id).await.unwrap();

    let err = f.manager.restore(&restored.id, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyRestored);

    let err = f.manager.restore(&purged.id, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyPurged);

    let err = f.manager.restore(&Uuid::new_v4().to_string(), &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = f.manager.restore("not-a-uuid", &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invalid);
}

#[tokio::test]
async fn test_tombstones_are_pruned_after_retention() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    f.manager.restore(&entry.id, &editor()).await.unwrap();

    f.clock.advance(Duration::days(31));
    let report = f.manager.purge_expired().await.unwrap();
    assert_eq!(report.tombstones_pruned, 1);

    let err = f.manager.restore(&entry.id, &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_purges_are_counted_and_retried() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    f.clock.advance(Duration::days(31));

    f.bin_repository.set_fail_purge(true);
    let report = f.manager.purge_expired().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(f.bin_repository.active_count(), 1);

    f.bin_repository.set_fail_purge(false);
    let report = f.manager.purge_expired().await.unwrap();
    assert_eq!(report.purged, 1);
    assert_eq!(f.bin_repository.active_count(), 0);
}

#[tokio::test]
async fn test_viewer_cannot_delete_or_restore() {
    let f = fixture();
    f.sops.save(sop("abc123")).await.unwrap();
    let viewer = Actor::new("viewer-1", Role::Viewer);

    let err = f.manager.delete_document("sops", "abc123", &viewer).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert!(f.sops.contains("abc123"));

    let entry = f.manager.delete_document("sops", "abc123", &editor()).await.unwrap();
    let err = f.manager.restore(&entry.id, &viewer).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_denied_gate_blocks_every_operation() {
    let mut gate = MockGate::new();
    gate.expect_authorize().returning(|_, _| false);
    let f = fixture_with_gate(gate);

    let err = f.manager.list(None, &admin()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_listing_is_scoped_to_deleting_actor() {
    let f = fixture();
    let other = Actor::new("editor-2", Role::Editor);
    f.sops.save(sop("mine")).await.unwrap();
    f.batches.save(batch("theirs")).await.unwrap();

    let mine = f.manager.delete_document("sops", "mine", &editor()).await.unwrap();
    f.clock.advance(Duration::minutes(5));
    f.manager.delete_document("team_batches", "theirs", &other).await.unwrap();

    let listing = f.manager.list(None, &editor()).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].original_id, "mine");

    let err = f.manager.restore(&mine.id, &other).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // El administrador ve todo, lo más reciente primero
    let listing = f.manager.list(None, &admin()).await.unwrap();
    let ids: Vec<_> = listing.iter().map(|e| e.original_id.as_str()).collect();
    assert_eq!(ids, vec!["theirs", "mine"]);

    let listing = f.manager.list(Some(CollectionName::TeamBatches), &admin()).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].description, "Warehouse (2 members)");
}

#[tokio::test]
async fn test_invalid_collection_and_mismatched_snapshot() {
    let f = fixture();

    let err = f.manager.delete_document("invoices", "x", &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invalid);

    let snapshot = sop("abc123").to_snapshot().unwrap();
    let err = f.manager
        .move_to_bin(CollectionName::TeamBatches, "abc123", snapshot.clone(), &editor())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invalid);

    let err = f.manager
        .move_to_bin(CollectionName::Sops, "other", snapshot, &editor())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invalid);
    assert_eq!(f.bin_repository.active_count(), 0);
}

#[tokio::test]
async fn test_untitled_announcement_uses_fallback_title() {
    let f = fixture();
    f.announcements
        .save(Announcement {
            id: "0123456789abcdef".to_string(),
            headline: None,
            body: "Dock 3 closed on Friday".to_string(),
            audience: None,
        })
        .await
        .unwrap();

    let entry = f.manager
        .delete_document("announcements", "0123456789abcdef", &editor())
        .await
        .unwrap();
    assert_eq!(entry.title, "Announcement (01234567…)");
    assert_eq!(entry.description, "Dock 3 closed on Friday");
}

#[tokio::test]
async fn test_missing_document_cannot_be_deleted() {
    let f = fixture();
    let err = f.manager.delete_document("sops", "ghost", &editor()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(f.bin_repository.active_count(), 0);
}
