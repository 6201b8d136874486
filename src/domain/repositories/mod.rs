pub mod bin_repository;
pub mod document_repository;
