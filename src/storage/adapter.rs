//! The adapter contract the loader reads documents through.

use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::CdmResult;

/// Reads bytes for one namespace.
///
/// Adapter paths are the path part of a corpus path, without the
/// namespace prefix (`/core/order.cdm.json`). Every call may suspend.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Read the bytes of the object at the given adapter path.
    async fn read(&self, adapter_path: &str) -> CdmResult<Vec<u8>>;

    /// Last time the object at the path changed, when the backing store
    /// tracks it.
    async fn compute_last_modified_time(
        &self,
        adapter_path: &str,
    ) -> CdmResult<Option<SystemTime>>;

    /// Names of the entries directly under a folder path.
    async fn list_children(&self, folder_path: &str) -> CdmResult<Vec<String>>;
}
