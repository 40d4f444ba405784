//! Error types for Isleguard Core

use thiserror::Error;

use crate::manifest::ManifestError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("World is not registered: {0}")]
    UnregisteredWorld(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
