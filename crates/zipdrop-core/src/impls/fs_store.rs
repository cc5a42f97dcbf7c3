//! FsArchiveStore - ディレクトリにファイルとして保存するストア
//!
//! # レイアウト
//! ```text
//! staging_dir/
//! └── {ulid}.part        ← 書き込み中の一時ファイル
//! archive_dir/
//! └── {archive_id}.zip   ← 公開済みアーカイブ（ディレクトリ一覧が index）
//! ```
//!
//! # put の流れ
//! 1. staging_dir に一時ファイルを書いて fsync（mtime = created_at）
//! 2. `{id}.zip` へ hard link（既にあれば AlreadyExists、上書きしない）
//! 3. 一時ファイルを削除
//!
//! hard link で公開するので、読み手が書きかけのファイルを見ることはない。
//!
//! ## hard link が使えない場合
//! staging_dir と archive_dir が別デバイス（EXDEV）、またはファイルシステムが
//! link を持たない（vfat / exFAT / 一部の SMB・FUSE は EPERM / ENOTSUP）場合は
//! `create_new` で `{id}.zip` に直接書く。上書きしない点は同じだが、
//! この経路では公開がアトミックではなく、書き込み中の `get` は
//! 途中までの内容を読むことがある。本当に権限がない場合は
//! 直接書きの `create_new` がそのままエラーを返す。

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::domain::ids::ARCHIVE_EXTENSION;
use crate::domain::{ArchiveId, ArchiveInfo, StoreError, StoredArchive};
use crate::ports::ArchiveStore;

const STAGING_EXTENSION: &str = "part";

#[derive(Debug, Clone)]
pub struct FsArchiveStore {
    staging_dir: PathBuf,
    archive_dir: PathBuf,
}

impl FsArchiveStore {
    /// ディレクトリを作成してストアを開く
    ///
    /// 前回のプロセスが残した一時ファイルはここで掃除する。
    pub async fn open(
        staging_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let store = Self {
            staging_dir: staging_dir.into(),
            archive_dir: archive_dir.into(),
        };
        tokio::fs::create_dir_all(&store.staging_dir).await?;
        tokio::fs::create_dir_all(&store.archive_dir).await?;
        store.remove_stale_staging_files().await?;
        Ok(store)
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    fn archive_path(&self, id: &ArchiveId) -> PathBuf {
        self.archive_dir.join(id.file_name())
    }

    async fn remove_stale_staging_files(&self) -> Result<(), StoreError> {
        let mut entries = tokio::fs::read_dir(&self.staging_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STAGING_EXTENSION) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed stale staging file"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale staging file"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for FsArchiveStore {
    async fn put(
        &self,
        id: &ArchiveId,
        blob: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let staging_dir = self.staging_dir.clone();
        let final_path = self.archive_path(id);
        let modified = SystemTime::from(created_at);

        let published =
            tokio::task::spawn_blocking(move || publish(&staging_dir, &final_path, &blob, modified))
                .await
                .map_err(|e| StoreError::Io(io::Error::other(format!("put task failed: {e}"))))?;

        match published {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(id.clone()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn get(&self, id: &ArchiveId) -> Result<StoredArchive, StoreError> {
        let path = self.archive_path(id);
        let blob = match tokio::fs::read(&path).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let created_at = match id.created_at() {
            Some(t) => t,
            None => tokio::fs::metadata(&path).await?.modified()?.into(),
        };

        Ok(StoredArchive {
            id: id.clone(),
            blob,
            created_at,
        })
    }

    async fn stat(&self, id: &ArchiveId) -> Result<ArchiveInfo, StoreError> {
        let meta = match tokio::fs::metadata(self.archive_path(id)).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StoreError::NotFound(id.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let created_at = match id.created_at() {
            Some(t) => t,
            None => meta.modified()?.into(),
        };
        Ok(ArchiveInfo {
            id: id.clone(),
            size: meta.len(),
            created_at,
        })
    }

    async fn delete(&self, id: &ArchiveId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.archive_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list_ids(&self) -> Result<Vec<ArchiveId>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.archive_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let parsed = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(&format!(".{ARCHIVE_EXTENSION}")))
                .and_then(|stem| ArchiveId::parse(stem).ok());
            match parsed {
                Some(id) => ids.push(id),
                None => debug!(file = ?file_name, "ignoring non-archive file"),
            }
        }
        Ok(ids)
    }
}

/// 一時ファイル経由で `final_path` に公開する（blocking）
fn publish(
    staging_dir: &Path,
    final_path: &Path,
    blob: &[u8],
    modified: SystemTime,
) -> io::Result<()> {
    publish_with(staging_dir, final_path, blob, modified, |from, to| {
        fs::hard_link(from, to)
    })
}

fn publish_with(
    staging_dir: &Path,
    final_path: &Path,
    blob: &[u8],
    modified: SystemTime,
    link: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> io::Result<()> {
    let tmp_path = staging_dir.join(format!("{}.{STAGING_EXTENSION}", Ulid::new()));
    write_new_file(&tmp_path, blob, modified)?;

    let result = match link(&tmp_path, final_path) {
        Ok(()) => Ok(()),
        Err(e) if link_unavailable(e.kind()) => {
            debug!(error = %e, "hard link unavailable, writing archive directly");
            write_new_file(final_path, blob, modified)
        }
        Err(e) => Err(e),
    };

    if let Err(e) = fs::remove_file(&tmp_path) {
        warn!(path = %tmp_path.display(), error = %e, "failed to remove staging file");
    }
    result
}

/// link(2) がこの組み合わせでは使えないことを示すエラーか
///
/// link 非対応のファイルシステムは EPERM を返すので PermissionDenied も含める。
fn link_unavailable(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::CrossesDevices | io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied
    )
}

/// `create_new` で書く。途中で失敗したら書きかけを消す。
fn write_new_file(path: &Path, blob: &[u8], modified: SystemTime) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = file
        .write_all(blob)
        .and_then(|()| file.set_modified(modified))
        .and_then(|()| file.sync_all());
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}
