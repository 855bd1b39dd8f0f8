pub mod config;
pub mod provider;

pub mod error;
pub mod logger;
