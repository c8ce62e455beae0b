//! Plaintext backup document.
//!
//! Serialized as camelCase JSON, then gzipped and sealed into an envelope.
//! The `version` field is checked before anything else is parsed; documents
//! from an unknown format version are rejected outright.

use crate::crypto::{self, DerivedKey};
use crate::fingerprint::FingerprintSource;
use crate::fs::Project;
use crate::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Format versions this build can read.
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Full snapshot of every project's secret files at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub device_id: String,
    pub projects: Vec<ProjectSnapshot>,
}

/// A project as observed on the backing-up machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub id: String,
    pub name: String,
    pub git: Option<String>,

    /// Fingerprint digest, the only field used for matching.
    pub fingerprint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_source: Option<FingerprintSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_value: Option<String>,

    /// Local path at backup time. Informational only.
    pub path: String,

    pub envs: Vec<EnvEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub filename: String,
    pub checksum: String,
    pub content: String,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl BackupDocument {
    /// Package scanned projects into a new document stamped with the
    /// current time and format version.
    ///
    /// Projects without any secret file carry nothing to restore and are
    /// left out.
    pub fn assemble(projects: &[Project], device_id: &str) -> Self {
        let projects = projects
            .iter()
            .filter(|p| !p.secret_files.is_empty())
            .map(ProjectSnapshot::from)
            .collect();

        Self {
            version: FORMAT_VERSION,
            created_at: Utc::now(),
            device_id: device_id.to_string(),
            projects,
        }
    }

    pub fn file_count(&self) -> usize {
        self.projects.iter().map(|p| p.envs.len()).sum()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse decrypted bytes.
    ///
    /// Malformed JSON is reported as [`VaultError::Authentication`]: bytes
    /// that decrypt but don't parse are indistinguishable from a wrong key.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let probe: VersionProbe =
            serde_json::from_slice(bytes).map_err(|_| VaultError::Authentication)?;
        if !SUPPORTED_VERSIONS.contains(&probe.version) {
            return Err(VaultError::UnsupportedVersion(probe.version));
        }
        serde_json::from_slice(bytes).map_err(|_| VaultError::Authentication)
    }

    /// Encrypt the document into an envelope. Consumes the document so a
    /// given instance is sealed exactly once.
    pub fn seal(self, key: &DerivedKey) -> Result<String> {
        crypto::seal(&self.to_json()?, key)
    }

    /// Decrypt and parse an envelope.
    pub fn open(envelope: &str, key: &DerivedKey) -> Result<Self> {
        let plaintext = crypto::open(envelope, key)?;
        Self::from_json(&plaintext)
    }
}

impl From<&Project> for ProjectSnapshot {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            git: project.git_remote.clone(),
            fingerprint: project.fingerprint.digest.clone(),
            fingerprint_source: Some(project.fingerprint.source),
            fingerprint_value: Some(project.fingerprint.value.clone()),
            path: project.path.display().to_string(),
            envs: project
                .secret_files
                .iter()
                .map(|f| EnvEntry {
                    filename: f.relative_path.clone(),
                    checksum: f.checksum.clone(),
                    content: f.content.clone(),
                })
                .collect(),
        }
    }
}
