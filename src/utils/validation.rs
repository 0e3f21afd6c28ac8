//! Input validation primitives.

use std::path::Path;

use crate::error::{Error, Result};

/// Require a path to exist and be a directory.
pub fn require_dir(path: &Path, field: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::validation_invalid_argument(
            field,
            format!("Not a directory: {}", path.display()),
            None,
            None,
        ))
    }
}

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}
