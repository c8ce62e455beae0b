//! dotvault library
//!
//! Encrypted backup and restore of `.env` files across machines, keyed by a
//! single recovery phrase.

pub mod backup;
pub mod config;
pub mod context;
pub mod crypto;
pub mod fingerprint;
pub mod fs;
pub mod restore;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use context::VaultContext;
pub use utils::errors::VaultError;
pub type Result<T> = std::result::Result<T, VaultError>;
