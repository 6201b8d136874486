use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO representing an entry in the bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinEntryDto {
    pub id: String,
    pub original_id: String,
    pub collection_name: String,
    pub title: String,
    pub description: String,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub days_until_expiry: i64,
}

/// Identity of a document brought back from the bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoredDocumentDto {
    pub collection_name: String,
    pub original_id: String,
    pub restored_at: DateTime<Utc>,
}

/// Query parameters for listing the bin
#[derive(Debug, Default, Deserialize)]
pub struct ListBinQuery {
    pub collection: Option<String>,
}

/// Resultado de un ciclo de barrido
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entradas expiradas encontradas
    pub examined: usize,
    pub purged: usize,
    /// Restauradas entretanto o con restauración en curso
    pub skipped: usize,
    /// Fallos que se reintentarán en el siguiente ciclo
    pub failed: usize,
    pub tombstones_pruned: usize,
}
