pub mod config;
pub mod credential;
pub mod env;
pub mod executor;
#[cfg(feature = "cli")]
pub mod logging;
pub mod scenario;
pub mod suite;
