//! Writing rendered images to disk.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

const SOURCE: &str = "cyclemap::output";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Output directory `{}` does not exist.", .0.display())]
    DirectoryMissing(PathBuf),
    #[error("Permission denied writing to `{}`.", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Error saving image to `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write `bytes` to `path`, replacing any existing file. The parent directory must exist.
pub async fn save_image(bytes: &[u8], path: &Path) -> Result<(), SaveError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        let exists = tokio::fs::try_exists(parent)
            .await
            .map_err(|source| SaveError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            return Err(SaveError::DirectoryMissing(parent.to_path_buf()));
        }
    }

    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| match source.kind() {
            ErrorKind::PermissionDenied => SaveError::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => SaveError::DirectoryMissing(
                parent.map(Path::to_path_buf).unwrap_or_default(),
            ),
            _ => SaveError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

    info!(
        target = SOURCE,
        path = %path.display(),
        bytes = bytes.len(),
        "Map saved"
    );
    Ok(())
}
