//! StoredArchive / ArchiveInfo

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ArchiveId;

/// ストアが所有するアーカイブ
///
/// blob は put 後に変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArchive {
    pub id: ArchiveId,
    pub blob: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl StoredArchive {
    pub fn info(&self) -> ArchiveInfo {
        ArchiveInfo {
            id: self.id.clone(),
            size: self.blob.len() as u64,
            created_at: self.created_at,
        }
    }
}

/// API レスポンス用のメタ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub id: ArchiveId,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}
