use std::path::{Path, PathBuf};

use anyhow::Context;

/// Keeps a copy of every raw upload on disk, keyed by its original filename.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create upload directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the upload, replacing any earlier file with the same name.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let name = sanitized_filename(filename);
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Strip any directory components a client may have sent along with the name.
pub fn sanitized_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => "upload".to_string(),
        name => name.to_string(),
    }
}
