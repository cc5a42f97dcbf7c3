//! ArchiveStore port - アーカイブ Blob の保存先（InMemory / Filesystem）
//!
//! # 設計原則
//! - ストアの mapping が「どのアーカイブが存在するか」の正本
//! - 変更は put / delete だけを通る（同期の choke point）
//! - put は厳格に一意: 既存 ID には AlreadyExists を返し、上書きしない
//! - delete は冪等
//!
//! ID は `ArchiveId::parse` で検証済みのものしか渡らないので、
//! 実装側でパスの sanitize は不要です。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ArchiveId, ArchiveInfo, StoreError, StoredArchive};

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// blob を保存（既存 ID なら `StoreError::AlreadyExists`）
    async fn put(
        &self,
        id: &ArchiveId,
        blob: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// 保存済みアーカイブを取得（なければ `StoreError::NotFound`）
    async fn get(&self, id: &ArchiveId) -> Result<StoredArchive, StoreError>;

    /// blob を読まずにメタ情報だけ取得（なければ `StoreError::NotFound`）
    async fn stat(&self, id: &ArchiveId) -> Result<ArchiveInfo, StoreError> {
        Ok(self.get(id).await?.info())
    }

    /// 削除（存在しなくてもエラーにしない）
    async fn delete(&self, id: &ArchiveId) -> Result<(), StoreError>;

    /// 呼び出し時点のスナップショット（Sweeper 用）
    async fn list_ids(&self) -> Result<Vec<ArchiveId>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list_ids().await?.len())
    }
}
