//! Pipeline - アップロード → ZIP 生成 → 保存 → ID を返す
//!
//! # フロー（submit）
//! 1. 空入力なら即 EmptyInput（ストアには触らない）
//! 2. エントリ名を sanitize + 重複解消
//! 3. ArchiveBuilder で ZIP を生成（spawn_blocking）
//! 4. IdGenerator で ID を払い出す
//! 5. ArchiveStore::put
//!
//! 生成に失敗した場合は put まで進まないので、ストアに残骸は残らない。
//! Builder / Store のエラーはそのまま伝播する。
//!
//! # 起動時
//! 永続ストアには前のプロセスが作った ID が残っている。
//! [`Pipeline::resume_from_store`] でそれを IdGenerator に見せてから受け付ける。

use std::sync::Arc;

use tracing::{debug, info};

use crate::archive::{ArchiveBuilder, sanitize_entry_name, unique_entry_names};
use crate::domain::{ArchiveId, ArchiveInfo, PipelineError, StoreError, UploadedItem};
use crate::ports::{ArchiveStore, Clock, IdGenerator};

pub struct Pipeline {
    store: Arc<dyn ArchiveStore>,
    id_gen: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    builder: ArchiveBuilder,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        id_gen: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            id_gen,
            clock,
            builder: ArchiveBuilder::default(),
        }
    }

    pub fn with_builder(mut self, builder: ArchiveBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// ストアにある既存 ID を IdGenerator に登録し、その件数を返す
    pub async fn resume_from_store(&self) -> Result<usize, StoreError> {
        let ids = self.store.list_ids().await?;
        for id in &ids {
            self.id_gen.observe(id);
        }
        if let Some(newest) = ids.iter().max_by_key(|id| id.parts()) {
            debug!(archives = ids.len(), newest = %newest, "id generator resumed");
        }
        Ok(ids.len())
    }

    /// items を ZIP にまとめて保存し、ダウンロード用の ID を返す
    pub async fn submit(&self, mut items: Vec<UploadedItem>) -> Result<ArchiveId, PipelineError> {
        if items.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let names = unique_entry_names(items.iter().map(|item| sanitize_entry_name(&item.name)));
        for (item, name) in items.iter_mut().zip(names) {
            if item.name != name {
                debug!(original = %item.name, entry = %name, "renamed entry");
            }
            item.name = name;
        }
        let entries = items.len();

        let builder = self.builder;
        let blob = tokio::task::spawn_blocking(move || builder.build(items))
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))??;

        let id = self.id_gen.next_id();
        let created_at = id.created_at().unwrap_or_else(|| self.clock.now());
        let size = blob.len();
        self.store.put(&id, blob, created_at).await?;

        info!(archive_id = %id, entries, size, "archive stored");
        Ok(id)
    }

    /// トークン（`<id>` / `<id>.zip`）からアーカイブの中身を取得
    pub async fn retrieve(&self, token: &str) -> Result<Vec<u8>, PipelineError> {
        let id = ArchiveId::from_token(token)?;
        Ok(self.store.get(&id).await?.blob)
    }

    /// ダウンロードページ用のメタ情報（blob は読まない）
    pub async fn info(&self, token: &str) -> Result<ArchiveInfo, PipelineError> {
        let id = ArchiveId::from_token(token)?;
        Ok(self.store.stat(&id).await?)
    }
}
