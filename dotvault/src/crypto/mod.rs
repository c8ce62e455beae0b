//! Key derivation and the encrypted envelope.

pub mod envelope;
pub mod identity;

pub use envelope::{extract_salt, open, seal};
pub use identity::{DerivedKey, RecoveryPhrase, Salt};
