//! Utility modules for dotvault.

pub mod errors;
pub mod logger;
pub mod tasks;

pub use errors::{Result, VaultError};
