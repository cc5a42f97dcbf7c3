//! 起動設定（CLI フラグ / 環境変数）

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use zipdrop_core::config::{RetentionConfig, StorageConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// プロセス内メモリ（再起動で消える）
    Memory,
    /// ディレクトリに `<id>.zip` として保存
    Fs,
}

/// zipdrop: upload files, get one zip back.
#[derive(Debug, Parser)]
#[command(name = "zipdrop", version, about)]
pub struct Args {
    /// Listen address
    #[arg(long, env = "ZIPDROP_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Where archives are kept
    #[arg(long, env = "ZIPDROP_BACKEND", value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    /// Staging directory for partially written archives (fs backend)
    #[arg(long, env = "ZIPDROP_UPLOAD_DIR", default_value = "./uploads")]
    pub upload_dir: PathBuf,

    /// Directory holding `<id>.zip` files (fs backend)
    #[arg(long, env = "ZIPDROP_ARCHIVE_DIR", default_value = "./zips")]
    pub archive_dir: PathBuf,

    /// Archives older than this are deleted (e.g. "24h", "90min")
    #[arg(long, env = "ZIPDROP_MAX_AGE", default_value = "24h", value_parser = humantime::parse_duration)]
    pub max_age: Duration,

    /// How often the sweeper runs
    #[arg(long, env = "ZIPDROP_SWEEP_INTERVAL", default_value = "1h", value_parser = humantime::parse_duration)]
    pub sweep_interval: Duration,

    /// Request body limit for uploads, in bytes
    #[arg(long, env = "ZIPDROP_MAX_UPLOAD_BYTES", default_value_t = 32 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl Args {
    pub fn retention(&self) -> RetentionConfig {
        RetentionConfig {
            max_age: self.max_age,
            sweep_interval: self.sweep_interval,
        }
    }

    pub fn storage(&self) -> StorageConfig {
        match self.backend {
            Backend::Memory => StorageConfig::Memory,
            Backend::Fs => StorageConfig::Filesystem {
                staging_dir: self.upload_dir.clone(),
                archive_dir: self.archive_dir.clone(),
            },
        }
    }
}
