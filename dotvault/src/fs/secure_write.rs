//! Owner-only file writes for restored secrets.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Unix mode applied to every restored file.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Write `content` to `path`, creating parent directories as needed.
///
/// On Unix the file ends up with mode `0600` whether it was created or
/// overwritten.
pub fn write_owner_only(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = open_for_write(path)?;
    restrict_permissions(path)?;
    file.write_all(content)?;
    file.sync_all()?;

    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(SECRET_FILE_MODE)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// `mode()` only applies on creation, so existing files are tightened explicitly.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(SECRET_FILE_MODE))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    // On non-Unix platforms, permission bits are not applied
    Ok(())
}
