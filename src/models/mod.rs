pub mod config;
pub mod script;
