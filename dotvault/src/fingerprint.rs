//! Cross-machine project identity.
//!
//! A project is identified by the first available of, in priority order:
//! 1. its git remote URL (`origin`, else the first remote declared)
//! 2. the name declared in a package manifest
//! 3. its folder name
//!
//! The digest covers the raw value only and never the absolute path, so two
//! clones of the same repository anywhere on disk resolve identically.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifests consulted for a declared project name, in priority order.
const MANIFESTS: &[(&str, ManifestKind)] = &[
    ("package.json", ManifestKind::Json),
    ("Cargo.toml", ManifestKind::Cargo),
    ("pyproject.toml", ManifestKind::PyProject),
    ("composer.json", ManifestKind::Json),
    ("go.mod", ManifestKind::GoMod),
];

#[derive(Debug, Clone, Copy)]
enum ManifestKind {
    Json,
    Cargo,
    PyProject,
    GoMod,
}

/// Where a fingerprint value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintSource {
    Git,
    Package,
    Folder,
}

impl FingerprintSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FingerprintSource::Git => "git",
            FingerprintSource::Package => "package",
            FingerprintSource::Folder => "folder",
        }
    }
}

impl fmt::Display for FingerprintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub source: FingerprintSource,
    pub value: String,
    /// Lowercase hex SHA-256 of `value`. This is what restore compares.
    pub digest: String,
}

impl Fingerprint {
    pub fn new(source: FingerprintSource, value: impl Into<String>) -> Self {
        let value = value.into();
        let digest = hex::encode(Sha256::digest(value.as_bytes()));
        Self {
            source,
            value,
            digest,
        }
    }
}

/// Resolve the fingerprint of the project rooted at `root`.
pub fn resolve(root: &Path) -> Fingerprint {
    if let Some(remote) = git_remote(root) {
        let normalized = normalize_remote(&remote);
        if !normalized.is_empty() {
            return Fingerprint::new(FingerprintSource::Git, normalized);
        }
    }

    if let Some(name) = manifest_name(root) {
        return Fingerprint::new(FingerprintSource::Package, name);
    }

    Fingerprint::new(FingerprintSource::Folder, folder_name(root))
}

/// Raw remote URL from the project's git config, if any.
pub fn git_remote(root: &Path) -> Option<String> {
    let config = fs::read_to_string(git_dir(root)?.join("config")).ok()?;
    let remotes = parse_remotes(&config);

    remotes
        .iter()
        .find(|(name, _)| name == "origin")
        .or_else(|| remotes.first())
        .map(|(_, url)| url.clone())
}

/// Locate the git directory, following a `gitdir:` pointer file when `.git`
/// is a file (worktrees, submodules).
fn git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    let metadata = fs::metadata(&dot_git).ok()?;
    if metadata.is_dir() {
        return Some(dot_git);
    }

    let pointer = fs::read_to_string(&dot_git).ok()?;
    let target = pointer.trim().strip_prefix("gitdir:")?.trim();
    let gitdir = root.join(target);

    // Linked worktrees keep their remotes in the common directory.
    match fs::read_to_string(gitdir.join("commondir")) {
        Ok(common) => Some(gitdir.join(common.trim())),
        Err(_) => Some(gitdir),
    }
}

/// Extract `(remote name, url)` pairs in declaration order.
fn parse_remotes(config: &str) -> Vec<(String, String)> {
    let mut remotes = Vec::new();
    let mut current: Option<String> = None;

    for line in config.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = header
                .strip_prefix("remote")
                .map(str::trim)
                .and_then(|name| name.strip_prefix('"'))
                .and_then(|name| name.strip_suffix('"'))
                .map(str::to_string);
            continue;
        }

        let Some(name) = &current else { continue };
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "url" {
                let url = value.trim().trim_matches('"').to_string();
                if !url.is_empty() {
                    remotes.push((name.clone(), url));
                }
            }
        }
    }

    remotes
}

/// Trim whitespace, a trailing slash and a trailing `.git`.
fn normalize_remote(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url).to_string()
}

/// First non-empty name declared by a known manifest.
fn manifest_name(root: &Path) -> Option<String> {
    MANIFESTS.iter().find_map(|(file, kind)| {
        let content = fs::read_to_string(root.join(file)).ok()?;
        let name = match kind {
            ManifestKind::Json => json_name(&content),
            ManifestKind::Cargo => toml_name(&content, &[&["package", "name"]]),
            ManifestKind::PyProject => toml_name(
                &content,
                &[&["project", "name"], &["tool", "poetry", "name"]],
            ),
            ManifestKind::GoMod => go_module(&content),
        }?;
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn json_name(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    value.get("name")?.as_str().map(str::to_string)
}

fn toml_name(content: &str, paths: &[&[&str]]) -> Option<String> {
    let value: toml::Value = toml::from_str(content).ok()?;
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(&value, |node, key| node.get(*key))?
            .as_str()
            .map(str::to_string)
    })
}

fn go_module(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module ")
            .map(|m| m.trim().trim_matches('"').to_string())
    })
}

fn folder_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_git_config(root: &Path, config: &str) -> std::io::Result<()> {
        fs::create_dir_all(root.join(".git"))?;
        fs::write(root.join(".git/config"), config)
    }

    fn origin(url: &str) -> String {
        format!(
            "[core]\n\trepositoryformatversion = 0\n[remote \"origin\"]\n\turl = {}\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n",
            url
        )
    }

    #[test]
    fn test_git_remote_is_path_independent() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let a = temp_dir.path().join("home/alice/api");
        let b = temp_dir.path().join("work/api-clone");
        write_git_config(&a, &origin("https://example.com/org/api.git"))?;
        write_git_config(&b, &origin("https://example.com/org/api.git"))?;

        let fa = resolve(&a);
        let fb = resolve(&b);
        assert_eq!(fa.source, FingerprintSource::Git);
        assert_eq!(fa.value, "https://example.com/org/api");
        assert_eq!(fa.digest, fb.digest);
        Ok(())
    }

    #[test]
    fn test_git_takes_priority_over_manifest() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("web");
        write_git_config(&root, &origin("git@example.com:org/web.git"))?;
        fs::write(root.join("package.json"), r#"{"name": "web-frontend"}"#)?;

        let with_git = resolve(&root);
        assert_eq!(with_git.source, FingerprintSource::Git);

        fs::remove_dir_all(root.join(".git"))?;
        let without_git = resolve(&root);
        assert_eq!(without_git.source, FingerprintSource::Package);
        assert_eq!(without_git.value, "web-frontend");
        assert_ne!(with_git.digest, without_git.digest);
        Ok(())
    }

    #[test]
    fn test_prefers_origin_over_other_remotes() {
        let config = "[remote \"upstream\"]\n\turl = https://example.com/up/repo\n[remote \"origin\"]\n\turl = https://example.com/me/repo\n";
        let remotes = parse_remotes(config);
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].0, "upstream");

        let temp_dir = TempDir::new().unwrap();
        write_git_config(temp_dir.path(), config).unwrap();
        assert_eq!(
            git_remote(temp_dir.path()).as_deref(),
            Some("https://example.com/me/repo")
        );
    }

    #[test]
    fn test_first_remote_when_no_origin() {
        let config = "[branch \"main\"]\n\tremote = origin\n[remote \"fork\"]\n\turl = https://example.com/fork/repo.git\n";
        assert_eq!(
            parse_remotes(config),
            vec![("fork".to_string(), "https://example.com/fork/repo.git".to_string())]
        );
    }

    #[test]
    fn test_gitdir_pointer_file() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let real = temp_dir.path().join("modules/lib");
        fs::create_dir_all(&real)?;
        fs::write(real.join("config"), origin("https://example.com/org/lib.git"))?;

        let checkout = temp_dir.path().join("lib");
        fs::create_dir_all(&checkout)?;
        fs::write(checkout.join(".git"), format!("gitdir: {}\n", real.display()))?;

        let fp = resolve(&checkout);
        assert_eq!(fp.source, FingerprintSource::Git);
        assert_eq!(fp.value, "https://example.com/org/lib");
        Ok(())
    }

    #[test]
    fn test_manifest_order_and_formats() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("go.mod"), "module github.com/org/svc\n\ngo 1.22\n")?;
        assert_eq!(resolve(root).value, "github.com/org/svc");

        fs::write(
            root.join("pyproject.toml"),
            "[tool.poetry]\nname = \"poetry-app\"\n",
        )?;
        assert_eq!(resolve(root).value, "poetry-app");

        fs::write(root.join("Cargo.toml"), "[package]\nname = \"crate-app\"\n")?;
        assert_eq!(resolve(root).value, "crate-app");

        fs::write(root.join("package.json"), r#"{"name": "node-app"}"#)?;
        let fp = resolve(root);
        assert_eq!(fp.source, FingerprintSource::Package);
        assert_eq!(fp.value, "node-app");
        Ok(())
    }

    #[test]
    fn test_nameless_manifest_falls_through() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("workspace-root");
        fs::create_dir_all(&root)?;
        fs::write(root.join("Cargo.toml"), "[workspace]\nmembers = [\"a\"]\n")?;
        fs::write(root.join("package.json"), "{ not json")?;

        let fp = resolve(&root);
        assert_eq!(fp.source, FingerprintSource::Folder);
        assert_eq!(fp.value, "workspace-root");
        Ok(())
    }

    #[test]
    fn test_digest_covers_raw_value_only() {
        let folder = Fingerprint::new(FingerprintSource::Folder, "api");
        let package = Fingerprint::new(FingerprintSource::Package, "api");
        assert_eq!(folder.digest, hex::encode(Sha256::digest(b"api")));
        assert_eq!(folder.digest, package.digest);
        assert_ne!(folder, package);
    }

    #[test]
    fn test_normalize_remote() {
        assert_eq!(normalize_remote(" https://x.io/a/b.git/ "), "https://x.io/a/b");
        assert_eq!(normalize_remote("git@x.io:a/b"), "git@x.io:a/b");
    }
}
