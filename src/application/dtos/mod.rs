pub mod bin_dto;
