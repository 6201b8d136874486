pub mod auth_ports;
pub mod bin_ports;
pub mod collection_ports;
