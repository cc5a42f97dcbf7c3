//! InMemoryArchiveStore - プロセス内メモリに保持するストア
//!
//! # 実装詳細
//! - HashMap<ArchiveId, StoredArchive> を RwLock で保護
//! - get / list_ids は read lock（読み同士は並行）
//! - put / delete は write lock（すべての読み書きを排他）
//! - put の存在チェックと挿入は同じ write lock 内で行う
//!
//! プロセス再起動で全アーカイブが消える。

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{ArchiveId, ArchiveInfo, StoreError, StoredArchive};
use crate::ports::ArchiveStore;

#[derive(Default)]
pub struct InMemoryArchiveStore {
    archives: RwLock<HashMap<ArchiveId, StoredArchive>>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArchiveStore for InMemoryArchiveStore {
    async fn put(
        &self,
        id: &ArchiveId,
        blob: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut archives = self.archives.write().await;
        match archives.entry(id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(StoredArchive {
                    id: id.clone(),
                    blob,
                    created_at,
                });
                Ok(())
            }
        }
    }

    async fn get(&self, id: &ArchiveId) -> Result<StoredArchive, StoreError> {
        self.archives
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn stat(&self, id: &ArchiveId) -> Result<ArchiveInfo, StoreError> {
        self.archives
            .read()
            .await
            .get(id)
            .map(StoredArchive::info)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &ArchiveId) -> Result<(), StoreError> {
        self.archives.write().await.remove(id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<ArchiveId>, StoreError> {
        Ok(self.archives.read().await.keys().cloned().collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.archives.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn id(secs: i64) -> ArchiveId {
        ArchiveId::from_parts(secs, 0)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryArchiveStore::new();
        let now = Utc::now();
        store.put(&id(1), b"blob".to_vec(), now).await.unwrap();

        let archive = store.get(&id(1)).await.unwrap();
        assert_eq!(archive.id, id(1));
        assert_eq!(archive.blob, b"blob");
        assert_eq!(archive.created_at, now);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryArchiveStore::new();
        let err = store.get(&id(404)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id(404)));
    }

    #[tokio::test]
    async fn test_stat_reports_size_without_blob() {
        let store = InMemoryArchiveStore::new();
        let now = Utc::now();
        store.put(&id(1), vec![7; 300], now).await.unwrap();

        let info = store.stat(&id(1)).await.unwrap();
        assert_eq!(info.id, id(1));
        assert_eq!(info.size, 300);
        assert_eq!(info.created_at, now);

        assert!(matches!(
            store.stat(&id(2)).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let store = InMemoryArchiveStore::new();
        store.put(&id(1), b"first".to_vec(), Utc::now()).await.unwrap();

        let err = store
            .put(&id(1), b"second".to_vec(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.get(&id(1)).await.unwrap().blob, b"first");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryArchiveStore::new();
        store.put(&id(1), b"blob".to_vec(), Utc::now()).await.unwrap();

        store.delete(&id(1)).await.unwrap();
        assert!(matches!(
            store.get(&id(1)).await,
            Err(StoreError::NotFound(_))
        ));
        store.delete(&id(1)).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_ids_snapshot() {
        let store = InMemoryArchiveStore::new();
        for secs in [3, 1, 2] {
            store.put(&id(secs), vec![], Utc::now()).await.unwrap();
        }
        let mut ids = store.list_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_keep_every_entry() {
        let store = Arc::new(InMemoryArchiveStore::new());

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .put(&id(i), vec![i as u8; 16], Utc::now())
                        .await
                        .unwrap();
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 64);
        for i in 0..64 {
            assert_eq!(store.get(&id(i)).await.unwrap().blob, vec![i as u8; 16]);
        }
    }
}
