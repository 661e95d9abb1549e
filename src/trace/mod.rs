pub mod logger;
pub mod performance;
pub mod screenshot;
pub mod trace;
