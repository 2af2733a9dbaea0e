pub mod cache;
pub mod credits;
pub mod email;
pub mod payments;
pub mod redis;
pub mod vision;
