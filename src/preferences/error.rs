//! Preference storage errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse preferences: {0}")]
    Parse(String),

    #[error("Failed to encode preferences: {0}")]
    Encode(String),
}
