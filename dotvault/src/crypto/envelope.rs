//! Encrypted-at-rest representation of a backup.
//!
//! Wire format (base64, standard alphabet):
//!
//! ```text
//! [ salt (32) | nonce (12) | ciphertext (N) | tag (16) ]
//! ```
//!
//! The ciphertext wraps `gzip(plaintext)`. The salt is passed to AES-GCM as
//! associated data, so every byte of the envelope is covered by the tag.

use crate::crypto::identity::{DerivedKey, Salt, SALT_LEN};
use crate::{Result, VaultError};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use rand::{rngs::OsRng, RngCore};
use std::io::{Read, Write};

/// AES-GCM nonce length (96 bit).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// Compress and encrypt `plaintext` under `key`.
///
/// A fresh nonce is drawn on every call; callers cannot supply one.
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<String> {
    let compressed = compress(plaintext)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::Authentication)?;
    let salt = key.salt().as_bytes();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &compressed,
                aad: salt,
            },
        )
        .map_err(|_| VaultError::Authentication)?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(&nonce);
    out.extend(ciphertext);

    Ok(STANDARD.encode(out))
}

/// Read the salt out of an envelope so the key can be derived before opening.
pub fn extract_salt(envelope: &str) -> Result<Salt> {
    let raw = decode(envelope)?;
    Ok(split_salt(&raw))
}

/// Verify, decrypt and decompress an envelope.
///
/// Every failure, from bad base64 to a tag mismatch to a broken gzip stream,
/// surfaces as [`VaultError::Authentication`].
pub fn open(envelope: &str, key: &DerivedKey) -> Result<Vec<u8>> {
    let raw = decode(envelope)?;
    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::Authentication)?;
    let compressed = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: salt,
            },
        )
        .map_err(|_| VaultError::Authentication)?;

    decompress(&compressed).map_err(|_| VaultError::Authentication)
}

fn decode(envelope: &str) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|_| VaultError::Authentication)?;
    if raw.len() < HEADER_LEN + TAG_LEN {
        return Err(VaultError::Authentication);
    }
    Ok(raw)
}

fn split_salt(raw: &[u8]) -> Salt {
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&raw[..SALT_LEN]);
    Salt::from_bytes(salt)
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
