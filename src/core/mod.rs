// Public modules
pub mod defaults;
pub mod error;
pub mod import_paths;
pub mod install;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
