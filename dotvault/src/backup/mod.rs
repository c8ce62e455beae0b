//! Backup pipeline.
//!
//! scan → assemble → derive key → seal → upload. Blocking steps (directory
//! walk, PBKDF2) run on the blocking pool one at a time.

pub mod document;

use crate::context::VaultContext;
use crate::fs::scan_projects;
use crate::store::{BackupReceipt, RemoteStore};
use crate::utils::tasks::blocking;
use crate::Result;
use document::BackupDocument;
use std::path::Path;
use tracing::info;

/// What a completed backup contained.
#[derive(Debug, Clone)]
pub struct BackupSummary {
    pub receipt: BackupReceipt,
    pub projects: usize,
    pub files: usize,
}

/// Back up every secret file under `root`.
///
/// Returns `Ok(None)` without contacting the store when nothing was found.
pub async fn run_backup<S: RemoteStore>(
    ctx: &VaultContext<S>,
    root: &Path,
) -> Result<Option<BackupSummary>> {
    info!("Scanning {}", root.display());
    let projects = scan_projects(root, &ctx.scan_options).await?;

    let document = BackupDocument::assemble(&projects, &ctx.device_id);
    let project_count = document.projects.len();
    let file_count = document.file_count();
    info!(
        "Found {} projects, {} with secret files ({} files)",
        projects.len(),
        project_count,
        file_count
    );

    if file_count == 0 {
        info!("No secret files found, nothing to back up");
        return Ok(None);
    }

    let phrase = ctx.phrase.clone();
    let key = blocking(move || phrase.sealing_key()).await?;
    let envelope = document.seal(&key)?;

    info!("Uploading backup ({} bytes)", envelope.len());
    let receipt = ctx.store.create_backup(&envelope, &ctx.device_id).await?;
    info!("Backup {} stored", receipt.id);

    Ok(Some(BackupSummary {
        receipt,
        projects: project_count,
        files: file_count,
    }))
}
