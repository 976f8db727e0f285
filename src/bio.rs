//! Bio validation.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BioError {
    #[error("User bio is required.")]
    Missing,
    #[error("User bio must contain at least one alphanumeric character.")]
    NoAlphanumeric,
}

/// Accept a bio that has at least one alphanumeric character.
///
/// The bio is returned untouched; surrounding whitespace and punctuation are
/// part of what gets embedded.
pub fn validate_bio(bio: &str) -> Result<&str, BioError> {
    if bio.is_empty() {
        return Err(BioError::Missing);
    }
    if !bio.chars().any(char::is_alphanumeric) {
        return Err(BioError::NoAlphanumeric);
    }
    Ok(bio)
}
