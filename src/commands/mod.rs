pub mod auth;
pub mod deploy;
