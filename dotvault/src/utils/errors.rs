//! Custom error types for dotvault.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// Malformed or wrong-length recovery phrase.
    #[error("Invalid recovery phrase: {0}")]
    InvalidPhrase(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0} (check your connection and the server URL)")]
    Network(String),

    /// Wrong key, wrong phrase or corrupted blob. Deliberately carries no detail.
    #[error("Could not decrypt backup: wrong recovery phrase?")]
    Authentication,

    #[error("Unsupported backup format version: {0}")]
    UnsupportedVersion(u32),

    #[error("No backup found for this vault")]
    NoBackup,

    #[error("Checksum mismatch for {}", .0.display())]
    Integrity(PathBuf),

    #[error("Refusing to write outside the project: {0}")]
    UnsafePath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for VaultError {
    fn from(e: reqwest::Error) -> Self {
        VaultError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
