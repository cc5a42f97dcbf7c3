//! Impls - ArchiveStore の実装
//!
//! # 含まれる実装
//! - **InMemoryArchiveStore**: プロセス内メモリ（再起動で消える）
//! - **FsArchiveStore**: ディレクトリに `<id>.zip` として保存

pub mod fs_store;
pub mod inmem_store;

use std::sync::Arc;

use tracing::info;

use crate::config::StorageConfig;
use crate::domain::StoreError;
use crate::ports::ArchiveStore;

// 主要な型を再エクスポート
pub use self::fs_store::FsArchiveStore;
pub use self::inmem_store::InMemoryArchiveStore;

/// StorageConfig からストアを開く
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn ArchiveStore>, StoreError> {
    match config {
        StorageConfig::Memory => {
            info!("using in-memory archive store");
            Ok(Arc::new(InMemoryArchiveStore::new()))
        }
        StorageConfig::Filesystem {
            staging_dir,
            archive_dir,
        } => {
            let store = FsArchiveStore::open(staging_dir, archive_dir).await?;
            info!(
                staging_dir = %store.staging_dir().display(),
                archive_dir = %store.archive_dir().display(),
                "using filesystem archive store"
            );
            Ok(Arc::new(store))
        }
    }
}
