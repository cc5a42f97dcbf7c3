//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - store が未設定なら BuildError::MissingStore
//! - max_age / sweep_interval が 0 なら BuildError
//!
//! Pipeline と Sweeper には同じ store / clock が注入される。

use std::sync::Arc;

use crate::archive::ArchiveBuilder;
use crate::config::RetentionConfig;
use crate::ports::{ArchiveStore, Clock, SystemClock, TimestampIdGenerator};

use super::pipeline::Pipeline;
use super::sweeper_loop::{SweeperHandle, SweeperLoop};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .store(Arc::new(InMemoryArchiveStore::new()))
///     .retention(RetentionConfig::default())
///     .build()?;
/// let sweeper = app.start_sweeper();
/// let id = app.pipeline().submit(items).await?;
/// ```
pub struct AppBuilder {
    store: Option<Arc<dyn ArchiveStore>>,
    clock: Arc<dyn Clock>,
    retention: RetentionConfig,
    archive_builder: ArchiveBuilder,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No archive store configured. Call AppBuilder::store() before build().")]
    MissingStore,

    #[error("max_age must be greater than zero")]
    ZeroMaxAge,

    #[error("sweep_interval must be greater than zero")]
    ZeroSweepInterval,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: Arc::new(SystemClock),
            retention: RetentionConfig::default(),
            archive_builder: ArchiveBuilder::default(),
        }
    }

    pub fn store(mut self, store: Arc<dyn ArchiveStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// テストでは FixedClock を渡す
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention(mut self, retention: RetentionConfig) -> Self {
        self.retention = retention;
        self
    }

    pub fn archive_builder(mut self, archive_builder: ArchiveBuilder) -> Self {
        self.archive_builder = archive_builder;
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        if self.retention.max_age.is_zero() {
            return Err(BuildError::ZeroMaxAge);
        }
        if self.retention.sweep_interval.is_zero() {
            return Err(BuildError::ZeroSweepInterval);
        }

        let id_gen = Arc::new(TimestampIdGenerator::new(self.clock.clone()));
        let pipeline = Pipeline::new(store.clone(), id_gen, self.clock.clone())
            .with_builder(self.archive_builder);
        let sweeper = SweeperLoop::new(store, self.clock, self.retention);

        Ok(App {
            pipeline: Arc::new(pipeline),
            sweeper,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は Pipeline と（未起動の）Sweeper を持つ
pub struct App {
    pipeline: Arc<Pipeline>,
    sweeper: SweeperLoop,
}

impl App {
    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    pub fn sweeper(&self) -> &SweeperLoop {
        &self.sweeper
    }

    /// Sweeper をバックグラウンドで起動
    pub fn start_sweeper(&self) -> SweeperHandle {
        self.sweeper.clone().spawn()
    }
}
