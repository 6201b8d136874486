pub mod bin_handler;
