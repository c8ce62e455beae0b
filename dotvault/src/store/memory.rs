//! In-process store used by pipeline tests.

use super::{BackupListing, BackupPage, BackupReceipt, LatestBackup, RemoteStore};
use crate::{Result, VaultError};
use chrono::Utc;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    backups: Mutex<Vec<LatestBackup>>,
    offline: bool,
}

impl MemoryStore {
    /// A store whose every call fails like an unreachable server.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.backups.lock().unwrap().len()
    }

    /// Replace the blob of the latest backup.
    pub fn tamper_latest(&self, f: impl FnOnce(&mut String)) {
        if let Some(latest) = self.backups.lock().unwrap().last_mut() {
            f(&mut latest.blob);
        }
    }

    fn online(&self) -> Result<()> {
        if self.offline {
            return Err(VaultError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    async fn create_backup(&self, blob: &str, device_id: &str) -> Result<BackupReceipt> {
        self.online()?;
        let mut backups = self.backups.lock().unwrap();
        let created_at = Utc::now();
        backups.push(LatestBackup {
            blob: blob.to_string(),
            created_at,
            device_id: device_id.to_string(),
        });
        Ok(BackupReceipt {
            id: format!("b{}", backups.len()),
            created_at,
            size_bytes: blob.len() as u64,
        })
    }

    async fn get_latest_backup(&self) -> Result<Option<LatestBackup>> {
        self.online()?;
        Ok(self.backups.lock().unwrap().last().cloned())
    }

    async fn list_backups(&self, limit: u32, offset: u32) -> Result<BackupPage> {
        self.online()?;
        let backups = self.backups.lock().unwrap();
        let items = backups
            .iter()
            .enumerate()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(i, b)| BackupListing {
                id: format!("b{}", i + 1),
                created_at: b.created_at,
                device_id: b.device_id.clone(),
                size_bytes: b.blob.len() as u64,
            })
            .collect();
        Ok(BackupPage {
            items,
            total: backups.len() as u64,
        })
    }
}
