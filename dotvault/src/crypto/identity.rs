//! Recovery phrase handling: key derivation and vault identity.
//!
//! Everything dotvault needs is derived from a single 12-word BIP-39 phrase:
//!
//! ```text
//! phrase ──PBKDF2-HMAC-SHA256(salt, 600k)──> 256-bit content key
//!        ──SHA-256──────────────────────────> vault id (bearer credential)
//! ```

use crate::{Result, VaultError};
use bip39::{Language, Mnemonic};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Number of words in a recovery phrase.
pub const PHRASE_WORDS: usize = 12;

/// PBKDF2 rounds used to stretch the phrase.
pub const KDF_ROUNDS: u32 = 600_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// 128 bits of entropy encode to 12 words.
const ENTROPY_LEN: usize = 16;

/// Random per-backup salt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the OS CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", hex::encode(self.0))
    }
}

/// Symmetric key bound to the salt it was derived with.
///
/// Sealing writes this salt into the envelope, so a key can only ever
/// produce envelopes that reopen with the same phrase.
pub struct DerivedKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
    salt: Salt,
}

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    #[cfg(test)]
    pub(crate) fn from_raw(bytes: [u8; KEY_LEN], salt: Salt) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
            salt,
        }
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("salt", &self.salt)
            .finish_non_exhaustive()
    }
}

/// A validated, normalized recovery phrase.
#[derive(Clone)]
pub struct RecoveryPhrase {
    words: Zeroizing<String>,
    rounds: u32,
}

impl RecoveryPhrase {
    /// Generate a new random 12-word phrase.
    pub fn generate() -> Result<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        OsRng.fill_bytes(&mut entropy[..]);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
            .map_err(|e| VaultError::InvalidPhrase(e.to_string()))?;
        Ok(Self {
            words: Zeroizing::new(mnemonic.to_string()),
            rounds: KDF_ROUNDS,
        })
    }

    /// Validate a user-supplied phrase.
    ///
    /// Whitespace and case are normalized. Anything that is not exactly
    /// twelve words from the English wordlist with a valid checksum is
    /// rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let words: Vec<String> = input
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        if words.len() != PHRASE_WORDS {
            return Err(VaultError::InvalidPhrase(format!(
                "expected {} words, got {}",
                PHRASE_WORDS,
                words.len()
            )));
        }

        let normalized = Zeroizing::new(words.join(" "));
        Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| VaultError::InvalidPhrase(e.to_string()))?;

        Ok(Self {
            words: normalized,
            rounds: KDF_ROUNDS,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.words
    }

    /// Deterministic identifier of the vault, presented to the remote store.
    ///
    /// Unsalted SHA-256 of the normalized phrase, lowercase hex.
    pub fn vault_id(&self) -> String {
        hex::encode(Sha256::digest(self.words.as_bytes()))
    }

    /// Derive the content key for a given salt.
    pub fn derive_key(&self, salt: &Salt) -> DerivedKey {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2_hmac::<Sha256>(
            self.words.as_bytes(),
            salt.as_bytes(),
            self.rounds,
            &mut bytes[..],
        );
        DerivedKey { bytes, salt: *salt }
    }

    /// Derive a key under a freshly generated salt, for sealing a new backup.
    pub fn sealing_key(&self) -> DerivedKey {
        self.derive_key(&Salt::random())
    }

    /// Cheaper key stretching so tests don't spend seconds in PBKDF2.
    #[cfg(test)]
    pub(crate) fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryPhrase(<redacted>)")
    }
}
