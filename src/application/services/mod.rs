pub mod adapter_registry;
pub mod bin_manager;
pub mod document_adapter;

#[cfg(test)]
mod bin_manager_test;

// Re-exportar para facilitar acceso
pub use adapter_registry::AdapterRegistry;
pub use bin_manager::BinManager;
pub use document_adapter::{AnnouncementAdapter, DocumentCollectionAdapter, SopAdapter, TeamBatchAdapter};
