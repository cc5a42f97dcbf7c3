//! UploadedItem - アップロードされた 1 ファイル
//!
//! リクエストの間だけ呼び出し側が所有し、アーカイブ生成で消費されます。

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{Cursor, Read};

/// UploadedItem は (名前, 中身) のペア
///
/// 中身は `Read` として保持するので、読み込み途中の失敗も表現できます。
pub struct UploadedItem {
    pub name: String,
    pub content: Box<dyn Read + Send>,
    /// ZIP エントリの更新時刻（なければ ZIP の既定値）
    pub modified: Option<DateTime<Utc>>,
}

impl UploadedItem {
    /// メモリ上のバイト列から作成
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(name, Cursor::new(content.into()))
    }

    /// 任意の reader から作成
    pub fn from_reader(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            content: Box::new(reader),
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

impl fmt::Debug for UploadedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedItem")
            .field("name", &self.name)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}
