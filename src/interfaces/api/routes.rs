use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::common::di::AppState;
use crate::interfaces::api::handlers::bin_handler;

/// Creates API routes for the application
pub fn create_api_routes(state: AppState) -> Router {
    let bin_router = Router::new()
        .route("/", get(bin_handler::list_bin))
        .route("/{id}/restore", post(bin_handler::restore_entry))
        .route("/{id}", delete(bin_handler::purge_entry));

    let documents_router = Router::new()
        .route("/{collection}/{id}", delete(bin_handler::delete_document));

    Router::new()
        .nest("/bin", bin_router)
        .nest("/documents", documents_router)
        .with_state(state)
}
