//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **Pipeline**: アップロード → ZIP → 保存、および取得
//! - **SweeperLoop**: 期限切れアーカイブの定期削除

pub mod builder;
pub mod pipeline;
pub mod sweeper_loop;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::pipeline::Pipeline;
pub use self::sweeper_loop::{SweepReport, SweeperHandle, SweeperLoop};
