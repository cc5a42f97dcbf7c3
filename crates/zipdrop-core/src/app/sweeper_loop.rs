//! SweeperLoop - 期限切れアーカイブの回収
//!
//! # フロー（1 回の sweep）
//! 1. ArchiveStore::list_ids() でスナップショットを取る
//! 2. 各 ID を作成時刻に戻し、`now - created_at > max_age` なら delete
//! 3. 時刻に戻せない ID はスキップ（消さない）
//! 4. delete の失敗はログに残して次へ（次回の sweep で再挑戦される）
//!
//! Sweeper はエラーを外に返さない。
//!
//! # スケジュール
//! - `tokio::time::interval` で sweep_interval ごとに実行（初回は即時）
//! - `SweeperHandle::trigger()` で臨時の sweep を要求できる
//! - sweep は 1 つの task 内で await されるので、2 つの sweep が重なることはない

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::RetentionConfig;
use crate::ports::{ArchiveStore, Clock};

/// interval に 0 を渡すと panic するので下限を設ける
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// 1 回の sweep の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    /// 作成時刻に戻せなかった ID
    pub skipped: usize,
    /// delete に失敗した ID
    pub failed: usize,
}

#[derive(Clone)]
pub struct SweeperLoop {
    store: Arc<dyn ArchiveStore>,
    clock: Arc<dyn Clock>,
    config: RetentionConfig,
}

impl SweeperLoop {
    pub fn new(store: Arc<dyn ArchiveStore>, clock: Arc<dyn Clock>, config: RetentionConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// 1 回だけ sweep を実行
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let now = self.clock.now();
        let max_age =
            chrono::Duration::from_std(self.config.max_age).unwrap_or(chrono::Duration::MAX);

        let ids = match self.store.list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "sweep: failed to list archives");
                return report;
            }
        };

        for id in ids {
            report.scanned += 1;

            let Some(created_at) = id.created_at() else {
                warn!(archive_id = %id, "sweep: cannot derive creation time, skipping");
                report.skipped += 1;
                continue;
            };
            if now - created_at <= max_age {
                continue;
            }

            match self.store.delete(&id).await {
                Ok(()) => {
                    info!(archive_id = %id, "deleted expired archive");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(archive_id = %id, error = %e, "sweep: failed to delete archive");
                    report.failed += 1;
                }
            }
        }

        if report.deleted > 0 || report.failed > 0 {
            info!(?report, "sweep finished");
        } else {
            debug!(?report, "sweep finished");
        }
        report
    }

    /// バックグラウンド task として起動
    ///
    /// 返された handle を drop しても loop は止まる（shutdown 送信側が消えるため）。
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let trigger = Arc::new(Notify::new());

        let join = tokio::spawn({
            let trigger = trigger.clone();
            async move { self.run(shutdown_rx, trigger).await }
        });

        SweeperHandle {
            shutdown_tx,
            trigger,
            join,
        }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>, trigger: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval.max(MIN_SWEEP_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // 送信側が drop されたら終了、値の変化は次のループで判定
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
                _ = trigger.notified() => {
                    debug!("sweep triggered manually");
                }
            }

            self.sweep_once().await;
        }
        debug!("sweeper stopped");
    }
}

/// Sweeper task の handle
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    trigger: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// 次の tick を待たずに sweep を要求（実行中なら終了後に 1 回）
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// 停止を要求（実行中の sweep は最後まで走る）
    pub fn request_shutdown(&self) {
        // ignore send error: loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// 停止して task の終了を待つ
    pub async fn shutdown(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
