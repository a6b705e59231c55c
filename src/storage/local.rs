//! Filesystem-backed storage adapter.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{CdmError, CdmResult};

use super::adapter::StorageAdapter;

/// Serves a namespace from a directory on disk.
pub struct LocalAdapter {
    root: PathBuf,
}

impl LocalAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, adapter_path: &str) -> PathBuf {
        self.root.join(adapter_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    async fn read(&self, adapter_path: &str) -> CdmResult<Vec<u8>> {
        let full = self.full_path(adapter_path);
        tokio::fs::read(&full).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => CdmError::NotFound(adapter_path.to_string()),
            _ => CdmError::Io(err),
        })
    }

    async fn compute_last_modified_time(
        &self,
        adapter_path: &str,
    ) -> CdmResult<Option<SystemTime>> {
        let metadata = tokio::fs::metadata(self.full_path(adapter_path)).await?;
        Ok(metadata.modified().ok())
    }

    async fn list_children(&self, folder_path: &str) -> CdmResult<Vec<String>> {
        let full = self.full_path(folder_path);
        let mut entries = tokio::fs::read_dir(&full).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for LocalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdapter")
            .field("root", &self.root.display())
            .finish()
    }
}

impl AsRef<Path> for LocalAdapter {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}
