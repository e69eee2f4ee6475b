use crate::models::AppFile;
use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve where `file` lands under `base`, refusing anything that escapes it.
pub fn target_path(base: &Path, file: &AppFile) -> Result<PathBuf> {
    if file.name.trim().is_empty() {
        bail!("writing file: empty file name for path '{}'", file.path);
    }
    let joined = Path::new(&file.path).join(&file.name);
    let mut relative = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => bail!("writing file: refusing path outside the working directory: {}", joined.display()),
        }
    }
    if relative.as_os_str().is_empty() {
        bail!("writing file: '{}' does not name a file", joined.display());
    }
    Ok(base.join(relative))
}

/// Write text content to a file asynchronously, creating parent directories.
pub async fn write_file_async(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("writing file: {}", path.display()))?;
    Ok(())
}

/// Write every file in order. Stops at the first failure; earlier files stay on disk.
pub async fn write_app_files(base: &Path, files: &[AppFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = target_path(base, file)?;
        write_file_async(&path, &file.content).await?;
        tracing::info!(path = %path.display(), bytes = file.content.len(), "file written");
        written.push(path);
    }
    Ok(written)
}
