pub mod config;
pub mod crawler;
pub mod policy;
pub mod recovery;
pub mod run_state;
