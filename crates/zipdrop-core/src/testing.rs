//! テスト用の ArchiveStore ラッパー（障害注入・並行度の観測）

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ArchiveId, ArchiveInfo, StoreError, StoredArchive};
use crate::impls::InMemoryArchiveStore;
use crate::ports::ArchiveStore;

/// InMemoryArchiveStore に障害と遅延を足したもの
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryArchiveStore,
    pub fail_put: bool,
    pub fail_delete: Mutex<HashSet<ArchiveId>>,
    pub list_delay: Option<Duration>,
    pub lists_in_flight: AtomicUsize,
    pub max_lists_in_flight: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FaultyStore {
    pub fn fail_delete_of(&self, id: &ArchiveId) {
        self.fail_delete.lock().unwrap().insert(id.clone());
    }
}

#[async_trait]
impl ArchiveStore for FaultyStore {
    async fn put(
        &self,
        id: &ArchiveId,
        blob: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_put {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.put(id, blob, created_at).await
    }

    async fn get(&self, id: &ArchiveId) -> Result<StoredArchive, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn stat(&self, id: &ArchiveId) -> Result<ArchiveInfo, StoreError> {
        self.inner.stat(id).await
    }

    async fn delete(&self, id: &ArchiveId) -> Result<(), StoreError> {
        if self.fail_delete.lock().unwrap().contains(id) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> Result<Vec<ArchiveId>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.lists_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_lists_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let ids = self.inner.list_ids().await;
        self.lists_in_flight.fetch_sub(1, Ordering::SeqCst);
        ids
    }
}
