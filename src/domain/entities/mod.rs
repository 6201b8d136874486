pub mod actor;
pub mod announcement;
pub mod bin_entry;
pub mod document;
pub mod sop;
pub mod team_batch;
