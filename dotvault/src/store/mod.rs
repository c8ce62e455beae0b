//! Remote blob store holding sealed backups.
//!
//! The store is addressed by the vault id and only ever sees envelopes; it
//! never receives the phrase or a derived key.

pub mod http;
#[cfg(test)]
pub mod memory;

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub use http::HttpStore;

/// Returned by the store after a backup is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReceipt {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// The most recent backup of a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBackup {
    pub blob: String,
    pub created_at: DateTime<Utc>,
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupListing {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub device_id: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPage {
    pub items: Vec<BackupListing>,
    pub total: u64,
}

/// Operations consumed from the remote store.
pub trait RemoteStore {
    fn create_backup(
        &self,
        blob: &str,
        device_id: &str,
    ) -> impl Future<Output = Result<BackupReceipt>> + Send;

    /// `Ok(None)` when the vault holds no backup yet.
    fn get_latest_backup(&self) -> impl Future<Output = Result<Option<LatestBackup>>> + Send;

    fn list_backups(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<BackupPage>> + Send;
}
