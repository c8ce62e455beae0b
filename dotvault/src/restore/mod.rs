//! Restore pipeline.
//!
//! fetch latest → read salt → derive key → open → scan locally → match →
//! write. Anything failing before the match phase aborts the run; failures
//! while writing are counted per file.

pub mod matcher;

use crate::backup::document::BackupDocument;
use crate::context::VaultContext;
use crate::crypto::extract_salt;
use crate::fs::scan_projects;
use crate::store::RemoteStore;
use crate::utils::tasks::blocking;
use crate::{Result, VaultError};
use chrono::{DateTime, Utc};
use matcher::{apply, match_projects, RestoreOutcome};
use std::path::Path;
use tracing::info;

/// Outcome of a restore along with where the backup came from.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub backup_created_at: DateTime<Utc>,
    pub backup_device_id: String,
    pub outcome: RestoreOutcome,
}

/// Fetch and decrypt the latest backup of the vault.
pub async fn fetch_latest<S: RemoteStore>(
    ctx: &VaultContext<S>,
) -> Result<(BackupDocument, DateTime<Utc>, String)> {
    let latest = ctx
        .store
        .get_latest_backup()
        .await?
        .ok_or(VaultError::NoBackup)?;
    info!(
        "Latest backup from {} at {}",
        latest.device_id, latest.created_at
    );

    let salt = extract_salt(&latest.blob)?;
    let phrase = ctx.phrase.clone();
    let key = blocking(move || phrase.derive_key(&salt)).await?;
    let document = BackupDocument::open(&latest.blob, &key)?;

    Ok((document, latest.created_at, latest.device_id))
}

/// Restore the latest backup into projects found under `root`.
pub async fn run_restore<S: RemoteStore>(
    ctx: &VaultContext<S>,
    root: &Path,
    force: bool,
) -> Result<RestoreReport> {
    let (document, created_at, device_id) = fetch_latest(ctx).await?;
    info!(
        "Backup holds {} projects ({} files)",
        document.projects.len(),
        document.file_count()
    );

    let local = scan_projects(root, &ctx.scan_options).await?;
    let plan = match_projects(document, &local);
    info!(
        "{} projects matched, {} unmatched",
        plan.matched.len(),
        plan.unmatched.len()
    );

    let outcome = blocking(move || apply(plan, force)).await?;

    Ok(RestoreReport {
        backup_created_at: created_at,
        backup_device_id: device_id,
        outcome,
    })
}
