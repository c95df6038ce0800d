use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use eframe::{App, Frame, egui};
use egui::{ColorImage, TextureHandle, TextureOptions};
use rfd::FileDialog;
use tokio::runtime::Handle;

use crate::{
    config::AppConfig,
    downloader::DownloadWorker,
    error::DownloadError,
    model::{AudioFormat, DownloadJob, OutputKind, TaskEvent, VideoQuality},
    thumbnail,
    url::{sanitize_url, video_id},
};

const YOUTUBE_ID_LEN: usize = 11;

/// Application state for the GUI
pub struct DownloaderApp {
    /// Runtime the download and thumbnail tasks are spawned on
    runtime: Handle,
    /// yt-dlp override from the config
    ytdlp_path: Option<PathBuf>,

    /// Input field for the video or playlist URL
    url_input: String,
    kind: OutputKind,
    playlist: bool,
    quality: VideoQuality,
    audio_format: AudioFormat,
    /// Destination folder; `None` is the current directory
    folder: Option<PathBuf>,

    /// The one running download, if any
    worker: Option<DownloadWorker>,
    /// Destination of the running download
    job_folder: PathBuf,
    progress: u8,
    status: String,
    /// Folder of the last completed download, for "Open Folder"
    completed_folder: Option<PathBuf>,
    /// Validation message shown in a modal window
    modal: Option<String>,

    /// Preview of the video currently in the URL field
    thumbnail: Option<(String, TextureHandle)>,
    /// Video id whose thumbnail was last requested
    thumbnail_wanted: Option<String>,
    /// Incoming thumbnail fetch results (video_id, image)
    thumbnail_results: Arc<Mutex<Vec<(String, ColorImage)>>>,
}

impl DownloaderApp {
    pub fn new(runtime: Handle, config: AppConfig) -> Self {
        Self {
            runtime,
            ytdlp_path: config.ytdlp_path,
            url_input: String::new(),
            kind: OutputKind::default(),
            playlist: false,
            quality: config.default_quality,
            audio_format: config.default_audio_format,
            folder: config.default_folder,
            worker: None,
            job_folder: PathBuf::from("."),
            progress: 0,
            status: String::new(),
            completed_folder: None,
            modal: None,
            thumbnail: None,
            thumbnail_wanted: None,
            thumbnail_results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn folder_label(&self) -> String {
        match &self.folder {
            Some(folder) => format!("Selected Folder: {}", folder.display()),
            None => "Selected Folder: Current Directory".to_owned(),
        }
    }

    fn select_folder(&mut self) {
        let mut dialog = FileDialog::new();
        if let Some(dir) = &self.folder {
            dialog = dialog.set_directory(dir);
        }
        // Cancelling the picker falls back to the current directory.
        self.folder = dialog.pick_folder();
    }

    fn start_download(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let folder = self.folder.clone().unwrap_or_else(|| PathBuf::from("."));
        let job = match DownloadJob::new(
            &self.url_input,
            self.kind,
            self.quality,
            self.audio_format,
            folder,
            self.playlist,
        ) {
            Ok(job) => job,
            Err(err @ DownloadError::EmptyUrl) => {
                self.modal = Some(err.to_string());
                return;
            }
            Err(err) => {
                self.status = format!("Error: {err}");
                return;
            }
        };

        tracing::info!(url = %job.url, kind = ?job.kind, playlist = job.playlist, "download requested");
        self.progress = 0;
        self.status.clear();
        self.completed_folder = None;
        self.job_folder = job.folder.clone();
        self.worker = Some(DownloadWorker::start(&self.runtime, job, self.ytdlp_path.clone()));
    }

    fn stop_download(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
            tracing::info!("download stopped by user");
        }
        self.status = "Download stopped.".to_owned();
        self.progress = 0;
    }

    fn poll_worker(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        // Checked before draining: a finished task has already sent its last event.
        let finished = worker.is_finished();
        let events = worker.poll();

        for event in events {
            match event {
                TaskEvent::Progress(pct) => self.progress = pct,
                TaskEvent::Finished => {
                    self.status = "Download completed.".to_owned();
                    self.completed_folder = Some(self.job_folder.clone());
                    self.worker = None;
                    return;
                }
                TaskEvent::Error(message) => {
                    self.status = format!("Error: {message}");
                    self.worker = None;
                    return;
                }
                TaskEvent::Stopped => {
                    self.worker = None;
                    return;
                }
            }
        }

        if finished {
            tracing::error!("download task ended without reporting a result");
            self.status = "Error: download task ended unexpectedly".to_owned();
            self.worker = None;
        }
    }

    /// Requests a preview when the URL points at a new YouTube video.
    fn refresh_thumbnail(&mut self, ctx: &egui::Context) {
        let wanted = video_id(&sanitize_url(&self.url_input, self.playlist))
            .filter(|id| id.len() == YOUTUBE_ID_LEN);
        if wanted == self.thumbnail_wanted {
            return;
        }
        self.thumbnail_wanted = wanted.clone();
        let Some(id) = wanted else {
            self.thumbnail = None;
            return;
        };

        let results = Arc::clone(&self.thumbnail_results);
        let ctx = ctx.clone();
        self.runtime.spawn_blocking(move || {
            if let Some(img) = thumbnail::fetch_thumbnail(&id) {
                if let Ok(mut pending) = results.lock() {
                    pending.push((id, img));
                }
                ctx.request_repaint();
            }
        });
    }

    fn poll_thumbnail(&mut self, ctx: &egui::Context) {
        let pending = match self.thumbnail_results.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        };
        if let Some((id, img)) = pick_wanted(pending, self.thumbnail_wanted.as_deref()) {
            let tex = ctx.load_texture(&id, img, TextureOptions::default());
            self.thumbnail = Some((id, tex));
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("YouTube Downloader");
        ui.add_space(6.0);

        ui.label("YouTube URL:");
        ui.add(
            egui::TextEdit::singleline(&mut self.url_input)
                .hint_text("Enter YouTube video or playlist URL")
                .desired_width(f32::INFINITY),
        );

        ui.horizontal(|ui| {
            ui.radio_value(&mut self.kind, OutputKind::Video, "Download Video");
            ui.radio_value(&mut self.kind, OutputKind::Audio, "Download Audio");
            ui.checkbox(&mut self.playlist, "Download Playlist");
        });

        ui.add_enabled_ui(self.kind == OutputKind::Video, |ui| {
            ui.label("Select Video Quality:");
            egui::ComboBox::from_id_source("video_quality")
                .selected_text(self.quality.label())
                .show_ui(ui, |ui| {
                    for q in VideoQuality::ALL {
                        ui.selectable_value(&mut self.quality, q, q.label());
                    }
                });
        });

        ui.add_enabled_ui(self.kind == OutputKind::Audio, |ui| {
            ui.label("Select Audio Format:");
            egui::ComboBox::from_id_source("audio_format")
                .selected_text(self.audio_format.label())
                .show_ui(ui, |ui| {
                    for f in AudioFormat::ALL {
                        ui.selectable_value(&mut self.audio_format, f, f.label());
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Download Folder:");
            if ui.button("Select Folder").clicked() {
                self.select_folder();
            }
        });
        ui.label(self.folder_label());

        if let Some((_, tex)) = &self.thumbnail {
            ui.add(egui::Image::new(tex).max_width(240.0));
        }

        ui.add_space(6.0);
        ui.add(egui::ProgressBar::new(self.progress as f32 / 100.0).show_percentage());

        let busy = self.worker.is_some();
        if ui.add_enabled(!busy, egui::Button::new("Download")).clicked() {
            self.start_download();
        }
        if ui.add_enabled(busy, egui::Button::new("Stop Download")).clicked() {
            self.stop_download();
        }

        ui.horizontal(|ui| {
            ui.label(&self.status);
            if let Some(folder) = &self.completed_folder {
                if ui.button("Open Folder").clicked() {
                    open_folder(folder);
                }
            }
        });
    }

    fn show_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.modal.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.modal = None;
                }
            });
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_worker();
        self.refresh_thumbnail(ctx);
        self.poll_thumbnail(ctx);

        let modal_open = self.modal.is_some();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| self.show_form(ui));
        });
        self.show_modal(ctx);

        // Keep redrawing while progress can arrive
        if self.worker.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Keeps the fetch result for the wanted id; results for older ids are dropped.
fn pick_wanted(
    results: Vec<(String, ColorImage)>,
    wanted: Option<&str>,
) -> Option<(String, ColorImage)> {
    let wanted = wanted?;
    results.into_iter().rev().find(|(id, _)| id == wanted)
}

/// Opens `folder` in the platform file manager
fn open_folder(folder: &Path) {
    let folder = folder.to_path_buf();
    std::thread::spawn(move || {
        let opener = if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        if let Err(err) = std::process::Command::new(opener).arg(&folder).spawn() {
            tracing::warn!("could not open {}: {err}", folder.display());
        }
    });
}
