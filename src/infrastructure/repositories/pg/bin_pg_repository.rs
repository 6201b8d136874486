use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::bin_entry::{BinEntry, CollectionName, EntryOutcome, Snapshot, Tombstone};
use crate::domain::repositories::bin_repository::BinRepository;

const UNIQUE_VIOLATION: &str = "23505";

/// Almacén de papelera sobre PostgreSQL
///
/// El invariante de una sola entrada activa lo garantiza el índice único
/// parcial `uq_bin_entries_active`; las transiciones terminales son un
/// `DELETE ... RETURNING` y la inserción de la lápida en la misma transacción.
pub struct BinPgRepository {
    pool: Arc<PgPool>,
}

impl BinPgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    // Método auxiliar para mapear errores SQL a errores de dominio
    fn map_sqlx_error(err: sqlx::Error) -> DomainError {
        match err {
            sqlx::Error::PoolTimedOut => {
                DomainError::transient("BinStore", "Timed out waiting for a database connection")
            },
            sqlx::Error::Io(e) => {
                DomainError::transient("BinStore", format!("Database I/O error: {}", e))
            },
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                DomainError::new(
                    crate::common::errors::ErrorKind::Conflict,
                    "BinEntry",
                    format!("Active bin entry already exists: {}", db_err.message()),
                )
            },
            other => DomainError::internal_error("BinStore", format!("Error de base de datos: {}", other)),
        }
    }

    fn row_to_entry(row: &PgRow) -> Result<BinEntry> {
        let collection: String = row.try_get("collection_name").map_err(Self::map_sqlx_error)?;
        let Json(snapshot): Json<Snapshot> = row.try_get("snapshot").map_err(Self::map_sqlx_error)?;

        Ok(BinEntry::from_parts(
            row.try_get("id").map_err(Self::map_sqlx_error)?,
            row.try_get("original_id").map_err(Self::map_sqlx_error)?,
            collection.parse()?,
            snapshot,
            row.try_get("deleted_at").map_err(Self::map_sqlx_error)?,
            row.try_get("expires_at").map_err(Self::map_sqlx_error)?,
            row.try_get("deleted_by").map_err(Self::map_sqlx_error)?,
            row.try_get("restored_at").map_err(Self::map_sqlx_error)?,
        ))
    }

    fn rows_to_entries(rows: Vec<PgRow>) -> Vec<BinEntry> {
        rows.iter()
            .filter_map(|row| match Self::row_to_entry(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    error!("Error converting bin row: {}", e);
                    None
                }
            })
            .collect()
    }

    async fn finish_entry(
        &self,
        id: &Uuid,
        outcome: EntryOutcome,
        at: DateTime<Utc>,
        expired_by: Option<DateTime<Utc>>,
    ) -> Result<Option<BinEntry>> {
        let mut tx = self.pool.begin().await.map_err(Self::map_sqlx_error)?;

        let row = sqlx::query(
            r#"
            DELETE FROM bin.entries
            WHERE id = $1
              AND restored_at IS NULL
              AND ($2::timestamptz IS NULL OR expires_at <= $2)
            RETURNING id, original_id, collection_name, snapshot,
                      deleted_at, expires_at, deleted_by, restored_at
            "#
        )
        .bind(id)
        .bind(expired_by)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Self::map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(Self::map_sqlx_error)?;
            return Ok(None);
        };
        let entry = Self::row_to_entry(&row)?;

        sqlx::query(
            r#"
            INSERT INTO bin.tombstones (entry_id, collection_name, original_id, outcome, at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (entry_id) DO UPDATE
            SET outcome = EXCLUDED.outcome, at = EXCLUDED.at
            "#
        )
        .bind(entry.id())
        .bind(entry.collection_name().as_str())
        .bind(entry.original_id())
        .bind(outcome.as_str())
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(Self::map_sqlx_error)?;

        tx.commit().await.map_err(Self::map_sqlx_error)?;
        Ok(Some(entry))
    }
}

#[async_trait]
impl BinRepository for BinPgRepository {
    #[instrument(skip(self, entry), fields(entry_id = %entry.id()))]
    async fn insert_active(&self, entry: &BinEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bin.entries (
                id, original_id, collection_name, snapshot,
                deleted_at, expires_at, deleted_by, restored_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, NULL
            )
            "#
        )
        .bind(entry.id())
        .bind(entry.original_id())
        .bind(entry.collection_name().as_str())
        .bind(Json(entry.snapshot()))
        .bind(entry.deleted_at())
        .bind(entry.expires_at())
        .bind(entry.deleted_by())
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        debug!("Entrada insertada en PostgreSQL: {}/{}", entry.collection_name(), entry.original_id());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_entry(&self, id: &Uuid) -> Result<Option<BinEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, original_id, collection_name, snapshot,
                   deleted_at, expires_at, deleted_by, restored_at
            FROM bin.entries
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    #[instrument(skip(self))]
    async fn list_active(&self, collection: Option<CollectionName>) -> Result<Vec<BinEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_id, collection_name, snapshot,
                   deleted_at, expires_at, deleted_by, restored_at
            FROM bin.entries
            WHERE restored_at IS NULL
              AND ($1::varchar IS NULL OR collection_name = $1)
            ORDER BY deleted_at DESC
            "#
        )
        .bind(collection.map(|c| c.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_entries(rows))
    }

    #[instrument(skip(self))]
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<BinEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_id, collection_name, snapshot,
                   deleted_at, expires_at, deleted_by, restored_at
            FROM bin.entries
            WHERE restored_at IS NULL AND expires_at <= $1
            ORDER BY expires_at ASC
            "#
        )
        .bind(now)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_entries(rows))
    }

    #[instrument(skip(self))]
    async fn complete_restore(&self, id: &Uuid, at: DateTime<Utc>) -> Result<Option<BinEntry>> {
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
        self.finish_entry(id, EntryOutcome::Purged, at, expired_by).await
    }

    #[instrument(skip(self))]
    async fn rollback(&self, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM bin.entries WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_tombstone(&self, id: &Uuid) -> Result<Option<Tombstone>> {
        let row = sqlx::query(
            r#"
            SELECT entry_id, collection_name, original_id, outcome, at
            FROM bin.tombstones
            WHERE entry_id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let collection: String = row.try_get("collection_name").map_err(Self::map_sqlx_error)?;
        let outcome: String = row.try_get("outcome").map_err(Self::map_sqlx_error)?;

        Ok(Some(Tombstone {
            entry_id: row.try_get("entry_id").map_err(Self::map_sqlx_error)?,
            collection_name: collection.parse()?,
            original_id: row.try_get("original_id").map_err(Self::map_sqlx_error)?,
            outcome: outcome.parse()?,
            at: row.try_get("at").map_err(Self::map_sqlx_error)?,
        }))
    }

    #[instrument(skip(self))]
    async fn prune_tombstones(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let result = sqlx::query("DELETE FROM bin.tombstones WHERE at < $1")
            .bind(older_than)
            .execute(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }
}
