mod config;
mod server;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zipdrop_core::app::AppBuilder;
use zipdrop_core::impls::open_store;

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // (A) ストアを開いて Pipeline / Sweeper をワイヤリング
    let store = open_store(&args.storage())
        .await
        .context("failed to open archive store")?;
    let app = AppBuilder::new()
        .store(store)
        .retention(args.retention())
        .build()
        .context("invalid configuration")?;
    let existing = app
        .pipeline()
        .resume_from_store()
        .await
        .context("failed to scan existing archives")?;
    info!(existing, "archive store ready");

    // (B) Sweeper を起動
    let sweeper = app.start_sweeper();
    info!(
        max_age = %humantime::format_duration(args.max_age),
        sweep_interval = %humantime::format_duration(args.sweep_interval),
        "retention sweeper started"
    );

    // (C) HTTP サーバ
    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    info!(addr = %listener.local_addr()?, "zipdrop listening");

    axum::serve(listener, server::router(app.pipeline(), args.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // (D) 実行中の sweep が終わるのを待って終了
    sweeper.shutdown().await;
    info!("zipdrop stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // signal handler なし: kill されるまで動き続ける
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
