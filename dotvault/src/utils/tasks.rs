//! Helpers for running synchronous work from async code.

use crate::{Result, VaultError};

/// Run a blocking closure on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VaultError::Io(std::io::Error::other(e)))
}
