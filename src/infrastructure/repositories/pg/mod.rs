pub mod bin_pg_repository;

pub use bin_pg_repository::BinPgRepository;
