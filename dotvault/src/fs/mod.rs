//! Filesystem access: project scanning and restricted-permission writes.

pub mod secure_write;
pub mod walker;

pub use walker::{scan, Project, ScanOptions, SecretFile};

use crate::utils::tasks::blocking;
use crate::Result;
use std::path::Path;

/// Scan `root` on the blocking pool.
pub async fn scan_projects(root: &Path, options: &ScanOptions) -> Result<Vec<Project>> {
    let root = root.to_path_buf();
    let options = options.clone();
    Ok(blocking(move || scan(&root, &options)).await??)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_scan_projects_runs_off_the_runtime() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let api = temp_dir.path().join("api");
        fs::create_dir_all(&api)?;
        fs::write(api.join("package.json"), r#"{"name": "api"}"#)?;
        fs::write(api.join(".env"), "KEY=1")?;

        let projects = scan_projects(temp_dir.path(), &ScanOptions::default()).await?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].secret_files.len(), 1);
        Ok(())
    }
}
