pub mod bin_expiry_scheduler;
pub mod jwt_access_gate;
