//! Reconcile a backup document with the projects found locally.

use crate::backup::document::{BackupDocument, EnvEntry, ProjectSnapshot};
use crate::fs::secure_write::write_owner_only;
use crate::fs::walker::checksum;
use crate::fs::Project;
use crate::{Result, VaultError};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// A backup project paired with its local checkout.
#[derive(Debug, Clone)]
pub struct MatchedProject {
    pub snapshot: ProjectSnapshot,
    pub local_path: PathBuf,
}

/// Partition of backup projects by whether a local checkout was found.
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    pub matched: Vec<MatchedProject>,
    pub unmatched: Vec<ProjectSnapshot>,
}

/// What happened to a single secret file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Restored,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCounts {
    pub restored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FileCounts {
    fn record(&mut self, action: FileAction) {
        match action {
            FileAction::Restored => self.restored += 1,
            FileAction::Skipped => self.skipped += 1,
            FileAction::Failed => self.failed += 1,
        }
    }
}

/// Result of one restore invocation.
#[derive(Debug, Clone, Default)]
pub struct RestoreOutcome {
    pub matched: Vec<MatchedProject>,
    pub unmatched: Vec<ProjectSnapshot>,
    pub counts: FileCounts,
}

/// Pair every backup project with a local project of the same fingerprint.
///
/// If two local projects share a digest the later one in scan order wins.
pub fn match_projects(document: BackupDocument, local: &[Project]) -> MatchPlan {
    let mut by_digest: HashMap<&str, &Path> = HashMap::with_capacity(local.len());
    for project in local {
        if let Some(previous) = by_digest.insert(&project.fingerprint.digest, &project.path) {
            warn!(
                "Projects {} and {} share a fingerprint; using the latter",
                previous.display(),
                project.path.display()
            );
        }
    }

    let mut plan = MatchPlan::default();
    for snapshot in document.projects {
        match by_digest.get(snapshot.fingerprint.as_str()) {
            Some(path) => {
                debug!("Matched {} -> {}", snapshot.name, path.display());
                plan.matched.push(MatchedProject {
                    local_path: path.to_path_buf(),
                    snapshot,
                });
            }
            None => plan.unmatched.push(snapshot),
        }
    }
    plan
}

/// Write the files of every matched project.
///
/// Existing files are left untouched unless `force` is set. Writes that would
/// land outside the project through a symlink are refused. A failure on one
/// file is logged and counted; it never stops the remaining files.
pub fn apply(plan: MatchPlan, force: bool) -> RestoreOutcome {
    let mut counts = FileCounts::default();

    for project in &plan.matched {
        for env in &project.snapshot.envs {
            counts.record(restore_file(&project.local_path, env, force));
        }
    }

    info!(
        "Restore finished: {} restored, {} skipped, {} failed",
        counts.restored, counts.skipped, counts.failed
    );

    RestoreOutcome {
        matched: plan.matched,
        unmatched: plan.unmatched,
        counts,
    }
}

/// Restore one file under `project_root`.
pub fn restore_file(project_root: &Path, env: &EnvEntry, force: bool) -> FileAction {
    match try_restore_file(project_root, env, force) {
        Ok(action) => action,
        Err(VaultError::Integrity(path)) => {
            warn!("Integrity check failed for {}, not restoring it", path.display());
            FileAction::Failed
        }
        Err(e) => {
            warn!("Failed to restore {}: {}", env.filename, e);
            FileAction::Failed
        }
    }
}

fn try_restore_file(project_root: &Path, env: &EnvEntry, force: bool) -> Result<FileAction> {
    let destination = project_root.join(safe_relative_path(&env.filename)?);

    if checksum(env.content.as_bytes()) != env.checksum {
        return Err(VaultError::Integrity(destination));
    }

    ensure_within(project_root, &destination, &env.filename)?;

    match std::fs::symlink_metadata(&destination) {
        Ok(_) if !force => {
            debug!("Skipping existing {}", destination.display());
            return Ok(FileAction::Skipped);
        }
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(VaultError::UnsafePath(env.filename.clone()));
        }
        _ => {}
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ensure_within(project_root, &destination, &env.filename)?;

    write_owner_only(&destination, env.content.as_bytes())?;
    debug!("Restored {}", destination.display());
    Ok(FileAction::Restored)
}

/// The nearest existing ancestor of `destination`'s parent must resolve,
/// symlinks followed, to somewhere inside `project_root`.
fn ensure_within(project_root: &Path, destination: &Path, filename: &str) -> Result<()> {
    let root = std::fs::canonicalize(project_root)?;

    let mut existing = destination.parent().unwrap_or(project_root);
    while std::fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => break,
        }
    }

    if !std::fs::canonicalize(existing)?.starts_with(&root) {
        return Err(VaultError::UnsafePath(filename.to_string()));
    }
    Ok(())
}

/// Only plain relative paths may be joined onto a project root.
fn safe_relative_path(filename: &str) -> Result<PathBuf> {
    let path = PathBuf::from(filename);
    let is_plain = path.components().all(|c| matches!(c, Component::Normal(_)));
    if filename.is_empty() || !is_plain {
        return Err(VaultError::UnsafePath(filename.to_string()));
    }
    Ok(path)
}
