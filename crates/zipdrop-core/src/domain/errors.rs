//! Errors - エラー型と分類
//!
//! Builder / Store のエラーはそのまま Pipeline の呼び出し側に伝播します。
//! Pipeline は `ErrorKind` で「入力の問題」と「ストレージ障害」を区別するだけです。

use thiserror::Error;

use super::ids::ArchiveId;

/// ErrorKind は呼び出し側（HTTP 層）向けの分類
///
/// - Input: 入力が不正（空アップロード、重複した名前など）→ 400
/// - NotFound: ID が存在しない、または形式不正 → 404
/// - Infrastructure: 読み書き・ZIP 生成の失敗 → 500
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    NotFound,
    Infrastructure,
}

/// 外部から来た ID 文字列が形式に合わない
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid archive identifier: {0:?}")]
pub struct InvalidIdentifier(pub String);

/// ArchiveError は ArchiveBuilder のエラー
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no items to archive")]
    EmptyInput,

    #[error("duplicate entry name: {0}")]
    DuplicateEntry(String),

    #[error("failed to read content of {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive: {0}")]
    Format(#[from] zip::result::ZipError),
}

/// StoreError は ArchiveStore のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("archive already exists: {0}")]
    AlreadyExists(ArchiveId),

    #[error("archive not found: {0}")]
    NotFound(ArchiveId),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// PipelineError は submit / retrieve のエラー
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no files submitted")]
    EmptyInput,

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("archive build task failed: {0}")]
    Join(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::EmptyInput => ErrorKind::Input,
            PipelineError::InvalidIdentifier(_) => ErrorKind::NotFound,
            PipelineError::Archive(ArchiveError::EmptyInput)
            | PipelineError::Archive(ArchiveError::DuplicateEntry(_)) => ErrorKind::Input,
            PipelineError::Archive(_) => ErrorKind::Infrastructure,
            PipelineError::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            PipelineError::Store(_) => ErrorKind::Infrastructure,
            PipelineError::Join(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
