mod action;
mod app;
mod app_state;
mod component;
mod components;
mod files;
mod filters;
mod focus;
mod theme;
mod widgets;

use std::sync::Arc;

use anyhow::{bail, Context};

use tgload_core::{Session, TdClient};
use tgload_proto::{config::Config, platform};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tgload_core=debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("tgload log: {}", log_path.display());

    tracing::info!("tgload starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config unreadable, using defaults: {:#}", e);
            Config::default()
        }
    };
    if config.telegram.chat_id == 0 {
        bail!(
            "no chat configured: set telegram.chat_id in {}",
            Config::config_path().display()
        );
    }

    // ── Connect ──────────────────────────────────────────────────────────────
    let remote = Arc::new(TdClient::spawn(&config.telegram)?);
    let session = Session::connect(remote, config.telegram.chat_id)
        .await
        .context("cant start session")?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(session, config);
    app.run().await?;

    tracing::info!("tgload stopped");
    Ok(())
}
