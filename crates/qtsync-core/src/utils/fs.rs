//! Filesystem helpers shared by the file-backed stores.

use std::path::Path;

/// Ensure the parent directory of a file path exists.
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    tokio::fs::create_dir_all(parent).await
}

/// Write `contents` to `path` atomically via a sibling temp file.
///
/// The file is created with mode 0600 on unix; credentials live in it.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    ensure_parent_dir(path).await?;

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    tokio::fs::rename(&temp_path, path).await
}

/// Read a file, mapping "not found" to `None`.
pub async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
