use async_trait::async_trait;

use crate::application::dtos::bin_dto::{BinEntryDto, RestoredDocumentDto, SweepReport};
use crate::common::errors::Result;
use crate::domain::entities::actor::Actor;
use crate::domain::entities::bin_entry::{CollectionName, Snapshot};

/// Port for recycle-bin use cases
#[async_trait]
pub trait BinUseCase: Send + Sync {
    /// Record a captured document in the bin and remove it from its native store
    async fn move_to_bin(
        &self,
        collection: CollectionName,
        original_id: &str,
        snapshot: Snapshot,
        actor: &Actor,
    ) -> Result<BinEntryDto>;

    /// Native delete of any document kind, redirected into the bin
    async fn delete_document(&self, collection: &str, original_id: &str, actor: &Actor) -> Result<BinEntryDto>;

    /// List active entries visible to the actor, newest first
    async fn list(&self, collection: Option<CollectionName>, actor: &Actor) -> Result<Vec<BinEntryDto>>;

    /// Restore an entry to its original identity
    async fn restore(&self, entry_id: &str, actor: &Actor) -> Result<RestoredDocumentDto>;

    /// Permanently delete an entry; missing or already purged entries are a no-op
    async fn purge(&self, entry_id: &str) -> Result<()>;

    /// Purge every entry past its retention window
    async fn purge_expired(&self) -> Result<SweepReport>;
}
