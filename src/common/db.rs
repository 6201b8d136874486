use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use anyhow::Result;
use std::time::Duration;
use crate::common::config::AppConfig;

const MAX_ATTEMPTS: usize = 3;

/// Esquema de la papelera; idempotente
const BIN_SCHEMA: &str = r#"
    CREATE SCHEMA IF NOT EXISTS bin;

    CREATE TABLE IF NOT EXISTS bin.entries (
        id UUID PRIMARY KEY,
        original_id VARCHAR(255) NOT NULL,
        collection_name VARCHAR(64) NOT NULL,
        snapshot JSONB NOT NULL,
        deleted_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        deleted_by VARCHAR(255) NOT NULL,
        restored_at TIMESTAMPTZ
    );

    -- Una sola entrada activa por documento
    CREATE UNIQUE INDEX IF NOT EXISTS uq_bin_entries_active
        ON bin.entries(collection_name, original_id)
        WHERE restored_at IS NULL;

    CREATE INDEX IF NOT EXISTS idx_bin_entries_expires_at ON bin.entries(expires_at);
    CREATE INDEX IF NOT EXISTS idx_bin_entries_deleted_by ON bin.entries(deleted_by);

    CREATE TABLE IF NOT EXISTS bin.tombstones (
        entry_id UUID PRIMARY KEY,
        collection_name VARCHAR(64) NOT NULL,
        original_id VARCHAR(255) NOT NULL,
        outcome VARCHAR(16) NOT NULL,
        at TIMESTAMPTZ NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_bin_tombstones_at ON bin.tombstones(at);
"#;

pub async fn create_database_pool(config: &AppConfig) -> Result<PgPool> {
    tracing::info!("Inicializando conexión a PostgreSQL con URL: {}",
                  config.database.connection_string.replace("postgres://", "postgres://[user]:[pass]@"));

    let mut attempt = 0;

    while attempt < MAX_ATTEMPTS {
        attempt += 1;
        tracing::info!("Intento de conexión a PostgreSQL #{}", attempt);

        // Crear el pool de conexiones con las opciones de configuración
        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.database.max_lifetime_secs))
            .connect(&config.database.connection_string)
            .await {
                Ok(pool) => {
                    match ensure_bin_schema(&pool).await {
                        Ok(()) => {
                            tracing::info!("Conexión a PostgreSQL establecida y esquema de papelera listo");
                            return Ok(pool);
                        },
                        Err(e) => {
                            tracing::error!("Error al crear el esquema de papelera: {}", e);
                            if attempt >= MAX_ATTEMPTS {
                                return Err(anyhow::anyhow!("Error en la conexión a PostgreSQL: {}", e));
                            }
                        }
                    }
                },
                Err(e) => {
                    tracing::error!("Error al conectar a PostgreSQL: {}", e);
                    if attempt >= MAX_ATTEMPTS {
                        return Err(anyhow::anyhow!("Error en la conexión a PostgreSQL: {}", e));
                    }
                }
            }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    Err(anyhow::anyhow!("No se pudo establecer la conexión a PostgreSQL después de {} intentos", MAX_ATTEMPTS))
}

/// Crea las tablas de la papelera si aún no existen
pub async fn ensure_bin_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    // Varias sentencias: protocolo simple, sin parámetros
    pool.execute(BIN_SCHEMA).await?;
    Ok(())
}
