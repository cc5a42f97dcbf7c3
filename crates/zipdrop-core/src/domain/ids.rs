//! Archive identifiers.
//!
//! # フォーマット
//! `ArchiveId` は作成時刻（Unix 秒）から導出される文字列です。
//! - 通常: `1700000000`
//! - 同一秒内の 2 件目以降: `1700000000-1`, `1700000000-2`, ...
//!
//! ID はストアのキーであり、同時に公開ダウンロードトークンでもあります。
//! 外部から来た文字列は必ず [`ArchiveId::parse`] を通すので、
//! ストアには検証済みの ID しか渡りません（`../../etc/passwd` などは弾かれる）。
//!
//! ## 時刻としての ID
//! 秒部分はそのまま作成時刻に戻せます（[`ArchiveId::created_at`]）。
//! Sweeper はこれを使って経過時間を計算します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::InvalidIdentifier;

/// 公開ファイル名の拡張子
pub const ARCHIVE_EXTENSION: &str = "zip";

/// ID 文字列の最大長（秒 20 桁 + `-` + seq 20 桁）
const MAX_ID_LEN: usize = 41;

/// Identifier of a stored archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchiveId(String);

impl ArchiveId {
    /// 作成時刻（秒）と同一秒内の連番から ID を作成
    ///
    /// `seq == 0` のときはサフィックスなし。
    pub fn from_parts(unix_secs: i64, seq: u64) -> Self {
        if seq == 0 {
            Self(unix_secs.to_string())
        } else {
            Self(format!("{unix_secs}-{seq}"))
        }
    }

    /// 外部から来た文字列を検証して ArchiveId にする
    ///
    /// 許可するのは `<digits>` または `<digits>-<digits>` のみ。
    /// generator が作らない形（先頭ゼロ、`-0`）は受け付けない。
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        let invalid = || InvalidIdentifier(raw.chars().take(64).collect());

        if raw.is_empty() || raw.len() > MAX_ID_LEN {
            return Err(invalid());
        }
        let (secs, seq) = match raw.split_once('-') {
            Some((secs, seq)) => (secs, Some(seq)),
            None => (raw, None),
        };
        if !is_canonical_number(secs) {
            return Err(invalid());
        }
        if let Some(seq) = seq
            && (!is_canonical_number(seq) || seq == "0")
        {
            return Err(invalid());
        }
        Ok(Self(raw.to_string()))
    }

    /// ダウンロードトークン（`<id>` または `<id>.zip`）をパース
    pub fn from_token(token: &str) -> Result<Self, InvalidIdentifier> {
        Self::parse(token.strip_suffix(".zip").unwrap_or(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 保存・ダウンロード時のファイル名（`<id>.zip`）
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, ARCHIVE_EXTENSION)
    }

    /// (秒, 連番) に分解。`from_parts` の逆
    ///
    /// 値が i64 / u64 に収まらなければ None。
    pub fn parts(&self) -> Option<(i64, u64)> {
        match self.0.split_once('-') {
            Some((secs, seq)) => Some((secs.parse().ok()?, seq.parse().ok()?)),
            None => Some((self.0.parse().ok()?, 0)),
        }
    }

    /// ID の秒部分を作成時刻に戻す
    ///
    /// 秒が i64 / chrono の範囲外なら None（Sweeper は削除せずスキップする）。
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.0.split('-').next()?.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// 数字のみ、かつ先頭ゼロなし（`"0"` そのものは可）
fn is_canonical_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArchiveId {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArchiveId> for String {
    fn from(id: ArchiveId) -> Self {
        id.0
    }
}
