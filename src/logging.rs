use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "yt_downloader=info";

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
