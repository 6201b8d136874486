// Exportar los módulos principales del proyecto
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interfaces;

// Re-exportaciones públicas comunes
pub use application::ports::bin_ports::BinUseCase;
pub use application::ports::collection_ports::CollectionAdapter;
pub use application::services::bin_manager::BinManager;
pub use common::errors::{DomainError, ErrorKind};
pub use infrastructure::services::bin_expiry_scheduler::BinExpiryScheduler;
