pub mod client;
pub mod scripts;
