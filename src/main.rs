//! Main application for the YouTube Downloader GUI

// egui front-end and its state
mod app;
// Settings file and environment overrides
mod config;
// yt-dlp process driving and the background worker
mod downloader;
// Error type shared by validation and the download task
mod error;
// tracing subscriber setup
mod logging;
// Job descriptor and task events
mod model;
// Progress line parsing and percentage arithmetic
mod progress;
// Thumbnail fetching for the preview
mod thumbnail;
// Playlist parameter stripping and URL checks
mod url;

use anyhow::{Context, anyhow};
use eframe::egui::{self, Visuals};
use tokio::runtime::Runtime;

use app::DownloaderApp;
use config::AppConfig;

/// Program entry point: initializes logging and the runtime, then launches the GUI
fn main() -> anyhow::Result<()> {
    let loaded = AppConfig::load();
    let level = loaded.as_ref().ok().and_then(|c| c.log_level.clone());
    logging::init_tracing(level.as_deref());

    let config = loaded.unwrap_or_else(|err| {
        tracing::warn!("ignoring config file: {err:#}");
        AppConfig::fallback()
    });
    if let Some(path) = AppConfig::path() {
        tracing::debug!("config path: {}", path.display());
    }

    // Download and thumbnail tasks run here; the UI thread only spawns
    let rt = Runtime::new().context("failed to start the tokio runtime")?;
    let handle = rt.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 480.0])
            .with_title("YouTube Downloader"),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(DownloaderApp::new(handle, config))
        }),
    )
    .map_err(|err| anyhow!("GUI failed: {err}"))?;

    // Running downloads are killed with their tasks; pending thumbnail fetches are abandoned
    rt.shutdown_background();
    Ok(())
}
