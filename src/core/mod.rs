// Public API - core building blocks
pub mod config;
pub mod error;
pub mod log;
pub mod paths;
pub mod runner;
pub mod steps;

// Public API - feature modules
pub mod barrel;
pub mod db;
pub mod project_env;
pub mod publish;
pub mod screenshot;
pub mod version;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
