pub mod analysis;
pub mod gap;
pub mod job;
pub mod learning;
pub mod resume;
pub mod skill;
pub mod user;
