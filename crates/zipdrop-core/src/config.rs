//! Config - 起動時に読む設定値
//!
//! CLI / 環境変数からの読み込みは zipdrop-cli 側で行い、ここには値だけを置く。

use std::path::PathBuf;
use std::time::Duration;

/// 保持期間と掃除間隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    /// これより古いアーカイブは Sweeper が削除する
    pub max_age: Duration,
    /// Sweeper の実行間隔
    pub sweep_interval: Duration,
}

impl RetentionConfig {
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: Self::DEFAULT_MAX_AGE,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// どのバックエンドに保存するか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Filesystem {
        staging_dir: PathBuf,
        archive_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_day_and_one_hour() {
        let config = RetentionConfig::default();
        assert_eq!(config.max_age, Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval, Duration::from_secs(3_600));
    }
}
