//! Everything a backup or restore run needs, passed explicitly.

use crate::crypto::RecoveryPhrase;
use crate::fs::ScanOptions;
use crate::store::RemoteStore;

pub struct VaultContext<S: RemoteStore> {
    pub store: S,
    pub phrase: RecoveryPhrase,
    /// Identifies this machine in backups it creates
    pub device_id: String,
    pub scan_options: ScanOptions,
}

impl<S: RemoteStore> VaultContext<S> {
    pub fn new(store: S, phrase: RecoveryPhrase, device_id: String) -> Self {
        Self {
            store,
            phrase,
            device_id,
            scan_options: ScanOptions::default(),
        }
    }

    pub fn with_scan_options(mut self, scan_options: ScanOptions) -> Self {
        self.scan_options = scan_options;
        self
    }
}
