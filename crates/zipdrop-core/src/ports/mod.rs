//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Pipeline と Sweeper はこれらの trait にだけ依存し、
//! 実装（impls）は起動時に注入されます。

pub mod archive_store;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::archive_store::ArchiveStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, TimestampIdGenerator};
