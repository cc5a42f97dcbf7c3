//! zipdrop-core
//!
//! Core building blocks for zipdrop: bundle uploaded files into one ZIP,
//! keep it for a while, serve it back by id.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ArchiveId, UploadedItem, StoredArchive, errors）
//! - **ports**: 抽象化レイヤー（ArchiveStore, IdGenerator, Clock）
//! - **impls**: ArchiveStore の実装（InMemory / Filesystem）
//! - **archive**: ZIP の組み立てとエントリ名の sanitize
//! - **app**: アプリケーションロジック（AppBuilder, Pipeline, SweeperLoop）
//! - **config**: 保持期間・ストレージの設定値

pub mod app;
pub mod archive;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod testing;
