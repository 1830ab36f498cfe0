//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures loading or validating an observatory config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read observatory config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("observatory config not found at {0} (create one with `observatory config init`)")]
    NotFound(PathBuf),

    #[error("malformed observatory config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("bad setting `{field}`: {message}")]
    Validation { field: String, message: String },
}
