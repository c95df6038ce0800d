use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
};

use rust_embed::RustEmbed;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::DownloadError,
    model::{DownloadJob, OutputKind, TaskEvent},
    progress::{PROGRESS_TEMPLATE, parse_progress_line},
};

/// Optional yt-dlp build shipped inside the executable
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

/// How a yt-dlp run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Completed,
    Stopped,
}

fn bin_name() -> &'static str {
    if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }
}

/// Picks the yt-dlp to run: configured path, then the bundled copy, then PATH.
pub fn resolve_binary(configured: Option<&Path>) -> Result<PathBuf, DownloadError> {
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = extract_bundled()? {
        return Ok(path);
    }
    Ok(PathBuf::from(bin_name()))
}

fn extract_bundled() -> Result<Option<PathBuf>, DownloadError> {
    let bin = bin_name();
    let Some(data) = Asset::get(bin) else {
        return Ok(None);
    };
    let dir = std::env::temp_dir().join("yt-downloader");
    let tmp = dir.join(bin);
    let stale = std::fs::metadata(&tmp)
        .map(|meta| meta.len() != data.data.len() as u64)
        .unwrap_or(true);
    if stale {
        tracing::info!("extracting bundled yt-dlp to {}", tmp.display());
        std::fs::create_dir_all(&dir)?;
        let mut f = File::create(&tmp)?;
        f.write_all(&data.data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o755))?;
        }
    }
    Ok(Some(tmp))
}

/// Command-line arguments for one job, URL last.
pub fn build_args(job: &DownloadJob) -> Vec<String> {
    let output = job.folder.join("%(title)s.%(ext)s");
    let mut args = vec![
        "--ignore-errors".to_owned(),
        "--newline".to_owned(),
        "--progress-template".to_owned(),
        PROGRESS_TEMPLATE.to_owned(),
        "-o".to_owned(),
        output.to_string_lossy().into_owned(),
    ];

    args.push(if job.playlist { "--yes-playlist" } else { "--no-playlist" }.to_owned());

    match job.kind {
        OutputKind::Audio => {
            args.extend([
                "-f".to_owned(),
                "bestaudio/best".to_owned(),
                "-x".to_owned(),
                "--audio-format".to_owned(),
                job.audio_format.codec().to_owned(),
                "--audio-quality".to_owned(),
                "192K".to_owned(),
            ]);
        }
        OutputKind::Video => {
            args.push("-f".to_owned());
            args.push(job.video_quality.format_selector());
        }
    }

    args.push("--".to_owned());
    args.push(job.url.clone());
    args
}

/// Runs yt-dlp for `job` until it exits or `cancel` fires.
///
/// Progress is forwarded only while the token is live. Cancelling kills the
/// child outright, so partially written files stay in the destination folder.
pub async fn run_download(
    job: &DownloadJob,
    binary: &Path,
    events: &UnboundedSender<TaskEvent>,
    cancel: &CancellationToken,
) -> Result<Exit, DownloadError> {
    let args = build_args(job);
    tracing::info!(url = %job.url, kind = ?job.kind, binary = %binary.display(), "starting yt-dlp");
    tracing::debug!("yt-dlp args: {args:?}");

    let mut child = Command::new(binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => DownloadError::MissingBinary,
            _ => DownloadError::Spawn(err),
        })?;

    let (Some(out), Some(err)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(DownloadError::Io(std::io::Error::other("yt-dlp pipes not captured")));
    };
    let stderr_task = tokio::spawn(last_error_line(err));
    let mut reader = BufReader::new(out);
    // Partial reads survive a lost select race; cleared once a full line is handled.
    let mut buf = Vec::new();
    let mut stdout_open = true;
    let mut entry_completed = false;

    let status = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(err) = child.kill().await {
                    tracing::warn!("failed to kill yt-dlp: {err}");
                }
                stderr_task.abort();
                tracing::info!(url = %job.url, "download stopped");
                return Ok(Exit::Stopped);
            }
            read = reader.read_until(b'\n', &mut buf), if stdout_open => {
                if read? == 0 {
                    stdout_open = false;
                } else {
                    let line = decode_line(&buf);
                    buf.clear();
                    if forward_progress(&line, events, cancel) == Some(100) {
                        entry_completed = true;
                    }
                }
            }
            status = child.wait(), if !stdout_open => break status?,
        }
    };

    let last_error = stderr_task.await.ok().flatten();
    if status.success() {
        tracing::info!(url = %job.url, "download finished");
        Ok(Exit::Completed)
    } else if job.playlist && entry_completed {
        // --ignore-errors skipped the failing entries; the rest are on disk.
        tracing::warn!(
            url = %job.url,
            "playlist finished with skipped entries: {}",
            last_error.as_deref().unwrap_or("unknown error")
        );
        Ok(Exit::Completed)
    } else {
        let text = last_error.unwrap_or_else(|| format!("yt-dlp exited with {status}"));
        tracing::warn!(url = %job.url, "download failed: {text}");
        Err(DownloadError::Failed(text))
    }
}

// yt-dlp output follows the console code page and may carry undecodable file names.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_owned()
}

/// Sends the percentage carried by `line`, if any, and returns it.
fn forward_progress(
    line: &str,
    events: &UnboundedSender<TaskEvent>,
    cancel: &CancellationToken,
) -> Option<u8> {
    tracing::debug!("yt-dlp> {line}");
    if cancel.is_cancelled() {
        return None;
    }
    let pct = parse_progress_line(line).and_then(|tick| tick.percent())?;
    let _ = events.send(TaskEvent::Progress(pct));
    Some(pct)
}

// Drains stderr to EOF so yt-dlp never blocks on a full pipe; keeps the last ERROR line.
async fn last_error_line<R: AsyncRead + Unpin>(stderr: R) -> Option<String> {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut last = None;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                tracing::debug!("yt-dlp stderr> {line}");
                if line.starts_with("ERROR:") {
                    last = Some(line);
                }
            }
            Err(err) => {
                tracing::debug!("stopped reading yt-dlp stderr: {err}");
                break;
            }
        }
    }
    last
}

/// Handle to the single in-flight download, owned by the UI
pub struct DownloadWorker {
    cancel: CancellationToken,
    events: UnboundedReceiver<TaskEvent>,
    task: JoinHandle<()>,
}

impl DownloadWorker {
    /// Spawns the download on `runtime`. Exactly one terminal event
    /// (`Finished`, `Error` or `Stopped`) is sent at the end.
    pub fn start(runtime: &Handle, job: DownloadJob, ytdlp: Option<PathBuf>) -> Self {
        let (tx, rx) = unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = runtime.spawn(async move {
            let result = match resolve_binary(ytdlp.as_deref()) {
                Ok(binary) => run_download(&job, &binary, &tx, &token).await,
                Err(err) => Err(err),
            };
            let event = match result {
                Ok(Exit::Completed) => TaskEvent::Finished,
                Ok(Exit::Stopped) => TaskEvent::Stopped,
                Err(err) => TaskEvent::Error(err.to_string()),
            };
            let _ = tx.send(event);
        });

        Self {
            cancel,
            events: rx,
            task,
        }
    }

    /// Requests cancellation; the child process is killed without cleanup.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Drains every event received since the last call.
    pub fn poll(&mut self) -> Vec<TaskEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DownloadWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Fake yt-dlp executables for tests
#[cfg(all(test, unix))]
pub(crate) mod fake {
    use std::{fs::File, io::Write, os::unix::fs::PermissionsExt, path::PathBuf};

    /// Writes `body` as a `/bin/sh` script named `yt-dlp` into `dir`.
    pub(crate) fn ytdlp(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("yt-dlp");
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "#!/bin/sh\n{body}").unwrap();
            f.sync_all().unwrap();
        }
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
