pub mod bin_fs_repository;
pub mod document_fs_repository;

// Repositorios PostgreSQL
pub mod pg;

// Re-exportar para facilitar acceso
pub use bin_fs_repository::BinFsRepository;
pub use document_fs_repository::DocumentFsRepository;
pub use pg::BinPgRepository;
