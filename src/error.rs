use thiserror::Error;

/// Everything that can go wrong between pressing "Download" and yt-dlp exiting.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Nothing left to download once the URL was sanitized and trimmed.
    #[error("Please enter a valid YouTube URL.")]
    EmptyUrl,

    #[error("yt-dlp was not found (bundled, configured or on PATH)")]
    MissingBinary,

    #[error("failed to start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// yt-dlp exited unsuccessfully; holds its error text verbatim.
    #[error("{0}")]
    Failed(String),
}
