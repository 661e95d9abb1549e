pub mod registry;
pub mod screen_model;
pub mod signature;
