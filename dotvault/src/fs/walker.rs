//! Project discovery and secret-file collection.
//!
//! Both walks are iterative (walkdir keeps an explicit stack of open
//! directories), pre-order and sorted by file name so results are
//! deterministic across runs.

use crate::fingerprint::{self, Fingerprint};
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Any one of these in a directory makes it a project root.
pub const PROJECT_MARKERS: &[&str] = &[
    ".git",
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "go.mod",
    "composer.json",
    "Gemfile",
    "pom.xml",
    "build.gradle",
];

/// Dependency, build and vendor directories never descended into.
pub const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    "venv",
    ".venv",
    "coverage",
    ".next",
    ".nuxt",
];

/// Options for scanning
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Follow symbolic links
    pub follow_links: bool,

    /// Directory names to skip (exact match)
    pub skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_links: false,
            skip_dirs: SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    /// Default deny-list extended with user-configured names.
    pub fn with_extra_skip_dirs(extra: &[String]) -> Self {
        let mut options = Self::default();
        for dir in extra {
            if !options.skip_dirs.contains(dir) {
                options.skip_dirs.push(dir.clone());
            }
        }
        options
    }

    /// Hidden directories and deny-listed names are skipped.
    fn should_skip(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        name.starts_with('.') || self.skip_dirs.iter().any(|d| *d == name)
    }
}

/// One `.env`-pattern file read from a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretFile {
    /// Path relative to the project root, `/`-separated
    pub relative_path: String,

    /// Lowercase hex SHA-256 of `content`
    pub checksum: String,

    pub content: String,
}

impl SecretFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            relative_path: relative_path.into(),
            checksum: checksum(content.as_bytes()),
            content,
        }
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A detected project on the local machine.
#[derive(Debug, Clone)]
pub struct Project {
    /// Opaque per-scan identifier, never used for matching
    pub id: String,

    pub name: String,

    /// Absolute local path
    pub path: PathBuf,

    pub git_remote: Option<String>,

    pub fingerprint: Fingerprint,

    pub secret_files: Vec<SecretFile>,
}

impl Project {
    fn detect(path: &Path, options: &ScanOptions) -> Self {
        let fingerprint = fingerprint::resolve(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| fingerprint.value.clone());

        debug!(
            "Detected project {} at {} ({})",
            name,
            path.display(),
            fingerprint.source
        );

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            path: path.to_path_buf(),
            git_remote: fingerprint::git_remote(path),
            secret_files: find_secret_files(path, options),
            fingerprint,
        }
    }
}

/// Does this directory contain any project marker?
pub fn is_project_root(dir: &Path) -> bool {
    PROJECT_MARKERS
        .iter()
        .any(|marker| fs::symlink_metadata(dir.join(marker)).is_ok())
}

/// `.env` exactly, or `.env.<suffix>`.
pub fn is_env_file_name(name: &str) -> bool {
    if name == ".env" {
        return true;
    }

    match name.strip_prefix(".env.") {
        Some(suffix) => {
            !suffix.is_empty()
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        None => false,
    }
}

/// Discover projects under `root`.
///
/// A directory with a project marker is emitted and its subtree is not
/// searched for further projects. Unreadable directories are logged and
/// skipped.
///
/// # Returns
/// * `Ok(Vec<Project>)` - Projects in pre-order
/// * `Err(io::Error)` - If `root` itself cannot be resolved
pub fn scan(root: &Path, options: &ScanOptions) -> io::Result<Vec<Project>> {
    let root = fs::canonicalize(root)?;
    let mut projects = Vec::new();

    let mut walker = WalkDir::new(&root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter();

    while let Some(result) = walker.next() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path during scan: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        if entry.depth() > 0 && options.should_skip(entry.file_name()) {
            walker.skip_current_dir();
            continue;
        }

        if is_project_root(entry.path()) {
            projects.push(Project::detect(entry.path(), options));
            walker.skip_current_dir();
        }
    }

    Ok(projects)
}

/// Collect every `.env`-pattern file under `project_root`.
///
/// Applies the same directory skips as [`scan`] but ignores project
/// boundaries, so env files of nested sub-projects are included.
pub fn find_secret_files(project_root: &Path, options: &ScanOptions) -> Vec<SecretFile> {
    let mut files = Vec::new();

    let mut walker = WalkDir::new(project_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(result) = walker.next() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path in {}: {}", project_root.display(), e);
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if entry.depth() > 0 && options.should_skip(entry.file_name()) {
                walker.skip_current_dir();
            }
            continue;
        }

        if !file_type.is_file() || !is_env_file_name(&entry.file_name().to_string_lossy()) {
            continue;
        }

        match read_secret_file(entry.path(), project_root) {
            Ok(file) => files.push(file),
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    files
}

fn read_secret_file(path: &Path, root: &Path) -> io::Result<SecretFile> {
    let bytes = fs::read(path)?;
    let content =
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(SecretFile::new(relative_path(path, root), content))
}

/// Forward-slash relative path regardless of platform.
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
