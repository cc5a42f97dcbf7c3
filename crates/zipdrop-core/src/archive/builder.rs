//! ArchiveBuilder - UploadedItem の列から ZIP を 1 つ作る
//!
//! 状態を持たない純粋な変換です（ストアには触らない）。
//! エントリ名は item.name をそのまま使います。sanitize は Pipeline の責務。

use std::collections::HashSet;
use std::io::{self, Cursor, Read, Write};

use chrono::{DateTime, Datelike, Timelike, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::{ArchiveError, UploadedItem};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// ArchiveBuilder は ZIP の書き出し設定を保持
///
/// # 決定性
/// - エントリは入力順
/// - mtime は item.modified、なければ ZIP の既定値（1980-01-01）
///
/// 同じ入力からは同じバイト列ができる。
#[derive(Debug, Clone, Copy)]
pub struct ArchiveBuilder {
    compression: CompressionMethod,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    /// items を 1 つの ZIP blob にまとめる
    ///
    /// # エラー
    /// - 空入力: `ArchiveError::EmptyInput`
    /// - 同名エントリ: `ArchiveError::DuplicateEntry`
    /// - content の読み込み失敗: `ArchiveError::Io`
    /// - エントリ書き込み / finish の失敗: `ArchiveError::Format`
    pub fn build(&self, items: Vec<UploadedItem>) -> Result<Vec<u8>, ArchiveError> {
        if items.is_empty() {
            return Err(ArchiveError::EmptyInput);
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.name.as_str()) {
                return Err(ArchiveError::DuplicateEntry(item.name.clone()));
            }
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut buf = vec![0u8; COPY_BUF_SIZE];

        for mut item in items {
            let options = SimpleFileOptions::default()
                .compression_method(self.compression)
                .unix_permissions(0o644)
                .last_modified_time(zip_time(item.modified));

            zip.start_file(item.name.as_str(), options)?;
            copy_content(&mut item.content, &mut zip, &mut buf).map_err(|e| match e {
                CopyError::Read(source) => ArchiveError::Io {
                    name: item.name.clone(),
                    source,
                },
                CopyError::Write(source) => ArchiveError::Format(source.into()),
            })?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// 読み込み失敗と書き込み失敗を区別してコピー
fn copy_content(
    reader: &mut dyn Read,
    writer: &mut impl Write,
    buf: &mut [u8],
) -> Result<(), CopyError> {
    loop {
        let n = match reader.read(buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
    }
}

/// ZIP の DOS 時刻へ変換（範囲外は既定値）
fn zip_time(modified: Option<DateTime<Utc>>) -> zip::DateTime {
    let Some(t) = modified else {
        return zip::DateTime::default();
    };
    let Ok(year) = u16::try_from(t.year()) else {
        return zip::DateTime::default();
    };
    zip::DateTime::from_date_and_time(
        year,
        t.month() as u8,
        t.day() as u8,
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
    )
    .unwrap_or_default()
}
