//! IdGenerator port - ArchiveId 生成の抽象化
//!
//! ArchiveId は作成時刻（Unix 秒）から導出します。
//! テスト容易性のために、trait + Clock 注入にしています。
//!
//! # 衝突ポリシー: サフィックス
//! 同じ秒に 2 件目が来たら `<secs>-1`, `<secs>-2`, ... を払い出します。
//! 時計が巻き戻った場合も直前の秒に連番を付けるので、
//! 1 つの generator が返す ID は常に単調増加かつ一意です。
//!
//! 再起動直後はストアに既存 ID が残っているので、
//! 起動時に [`IdGenerator::observe`] で既存 ID を見せてから払い出します
//! （`Pipeline::resume_from_store`）。

use std::sync::Mutex;

use crate::domain::ArchiveId;
use crate::ports::Clock;

/// IdGenerator は新しいアーカイブの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数リクエストから同時に呼ばれる）
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> ArchiveId;

    /// 既に使われている ID を知らせる。以後はそれより大きい ID だけを返す。
    fn observe(&self, _id: &ArchiveId) {}
}

/// TimestampIdGenerator は Clock の秒を ID にする
pub struct TimestampIdGenerator<C> {
    clock: C,
    /// 最後に払い出した (秒, 連番)
    last: Mutex<Option<(i64, u64)>>,
}

impl<C: Clock> TimestampIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }
}

impl<C: Clock> IdGenerator for TimestampIdGenerator<C> {
    fn next_id(&self) -> ArchiveId {
        let now_secs = self.clock.now().timestamp().max(0);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let (secs, seq) = match *last {
            Some((last_secs, last_seq)) if now_secs <= last_secs => (last_secs, last_seq + 1),
            _ => (now_secs, 0),
        };
        *last = Some((secs, seq));

        ArchiveId::from_parts(secs, seq)
    }

    fn observe(&self, id: &ArchiveId) {
        let Some(parts) = id.parts() else {
            return;
        };
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.is_none_or(|current| parts > current) {
            *last = Some(parts);
        }
    }
}
