//! In-memory storage adapter, used by tests and demos.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{CdmError, CdmResult};

use super::adapter::StorageAdapter;

struct StoredFile {
    bytes: Vec<u8>,
    modified: SystemTime,
}

/// Serves a namespace from a map of path -> bytes.
#[derive(Default)]
pub struct MemoryAdapter {
    files: RwLock<HashMap<String, StoredFile>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put (or replace) a file at an adapter path.
    pub fn write_file(&self, adapter_path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut files = self.files.write().expect("memory adapter poisoned");
        files.insert(
            adapter_path.into(),
            StoredFile {
                bytes: bytes.into(),
                modified: SystemTime::now(),
            },
        );
    }

    pub fn remove_file(&self, adapter_path: &str) -> bool {
        let mut files = self.files.write().expect("memory adapter poisoned");
        files.remove(adapter_path).is_some()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn read(&self, adapter_path: &str) -> CdmResult<Vec<u8>> {
        let files = self.files.read().expect("memory adapter poisoned");
        files
            .get(adapter_path)
            .map(|file| file.bytes.clone())
            .ok_or_else(|| CdmError::NotFound(adapter_path.to_string()))
    }

    async fn compute_last_modified_time(
        &self,
        adapter_path: &str,
    ) -> CdmResult<Option<SystemTime>> {
        let files = self.files.read().expect("memory adapter poisoned");
        Ok(files.get(adapter_path).map(|file| file.modified))
    }

    async fn list_children(&self, folder_path: &str) -> CdmResult<Vec<String>> {
        let prefix = if folder_path.ends_with('/') {
            folder_path.to_string()
        } else {
            format!("{folder_path}/")
        };
        let files = self.files.read().expect("memory adapter poisoned");
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let files = self.files.read().expect("memory adapter poisoned");
        f.debug_struct("MemoryAdapter")
            .field("files", &files.len())
            .finish()
    }
}
