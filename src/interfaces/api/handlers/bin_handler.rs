use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{debug, instrument};

use crate::application::dtos::bin_dto::ListBinQuery;
use crate::application::ports::auth_ports::ensure_authorized;
use crate::common::di::AppState;
use crate::domain::entities::actor::BinAction;
use crate::domain::entities::bin_entry::CollectionName;
use crate::interfaces::errors::ApiError;
use crate::interfaces::middleware::auth::CurrentActor;

/// Lista las entradas activas de la papelera visibles para el actor
#[instrument(skip(state, actor))]
pub async fn list_bin(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListBinQuery>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Solicitud para listar papelera: actor={}, colección={:?}", actor.id, query.collection);

    let collection = query
        .collection
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(str::parse::<CollectionName>)
        .transpose()?;

    let entries = state.bin_service.list(collection, &actor).await?;
    debug!("Encontradas {} entradas en la papelera", entries.len());

    Ok((StatusCode::OK, Json(entries)))
}

/// Restaura una entrada a su identidad original
#[instrument(skip(state, actor))]
pub async fn restore_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let restored = state.bin_service.restore(&entry_id, &actor).await?;
    debug!("Entrada {} restaurada como {}/{}", entry_id, restored.collection_name, restored.original_id);

    Ok((StatusCode::OK, Json(restored)))
}

/// Elimina permanentemente una entrada (sólo administradores)
#[instrument(skip(state, actor))]
pub async fn purge_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ensure_authorized(state.access_gate.as_ref(), &actor, BinAction::Purge)?;

    state.bin_service.purge(&entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Borrado nativo de un documento, redirigido a la papelera
#[instrument(skip(state, actor))]
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((collection, document_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.bin_service.delete_document(&collection, &document_id, &actor).await?;
    debug!("Documento {}/{} enviado a papelera como {}", collection, document_id, entry.id);

    Ok((StatusCode::OK, Json(entry)))
}
