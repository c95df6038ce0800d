use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DownloadError;
use crate::url::validate_url;

/// What the user wants out of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Keep the video stream (with audio merged in)
    #[default]
    Video,
    /// Extract the audio track only
    Audio,
}

/// Video quality choices offered in the quality dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 5] = [
        VideoQuality::Best,
        VideoQuality::P1080,
        VideoQuality::P720,
        VideoQuality::P480,
        VideoQuality::P360,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VideoQuality::Best => "best",
            VideoQuality::P1080 => "1080p",
            VideoQuality::P720 => "720p",
            VideoQuality::P480 => "480p",
            VideoQuality::P360 => "360p",
        }
    }

    fn max_height(self) -> Option<u32> {
        match self {
            VideoQuality::Best => None,
            VideoQuality::P1080 => Some(1080),
            VideoQuality::P720 => Some(720),
            VideoQuality::P480 => Some(480),
            VideoQuality::P360 => Some(360),
        }
    }

    /// yt-dlp `-f` selector for this quality.
    pub fn format_selector(self) -> String {
        match self.max_height() {
            None => "bestvideo+bestaudio/best".to_owned(),
            Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Audio container choices offered in the audio dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Aac,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Mp3, AudioFormat::Aac, AudioFormat::Ogg];

    pub fn label(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "MP3",
            AudioFormat::Aac => "AAC",
            AudioFormat::Ogg => "OGG",
        }
    }

    /// Codec name handed to `--audio-format`. OGG means vorbis.
    pub fn codec(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "aac",
            AudioFormat::Ogg => "vorbis",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One download request, alive for the duration of a single background task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Sanitized, non-empty URL handed to yt-dlp
    pub url: String,
    /// Video or audio output
    pub kind: OutputKind,
    /// Quality used when `kind` is `Video`
    pub video_quality: VideoQuality,
    /// Codec used when `kind` is `Audio`
    pub audio_format: AudioFormat,
    /// Destination directory (`.` for the current directory)
    pub folder: PathBuf,
    /// Whether playlist parameters are kept and the whole list fetched
    pub playlist: bool,
}

impl DownloadJob {
    /// Builds a job from raw form input. Fails with `EmptyUrl` when nothing
    /// is left of the URL once playlist parameters are stripped.
    pub fn new(
        raw_url: &str,
        kind: OutputKind,
        video_quality: VideoQuality,
        audio_format: AudioFormat,
        folder: PathBuf,
        playlist: bool,
    ) -> Result<Self, DownloadError> {
        let url = validate_url(raw_url, playlist)?;
        Ok(Self {
            url,
            kind,
            video_quality,
            audio_format,
            folder,
            playlist,
        })
    }
}

/// Messages sent from the download task back to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// Whole-number percentage of the current file
    Progress(u8),
    /// yt-dlp exited successfully
    Finished,
    /// yt-dlp failed; error text as reported
    Error(String),
    /// The task was cancelled from the UI
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_selectors() {
        assert_eq!(VideoQuality::Best.format_selector(), "bestvideo+bestaudio/best");
        assert_eq!(
            VideoQuality::P720.format_selector(),
            "bestvideo[height<=720]+bestaudio/best[height<=720]"
        );
    }

    #[test]
    fn ogg_maps_to_vorbis() {
        assert_eq!(AudioFormat::Ogg.codec(), "vorbis");
        assert_eq!(AudioFormat::Mp3.codec(), "mp3");
        assert_eq!(AudioFormat::Aac.codec(), "aac");
    }

    #[test]
    fn job_rejects_whitespace_url() {
        let err = DownloadJob::new(
            "   ",
            OutputKind::Video,
            VideoQuality::Best,
            AudioFormat::Mp3,
            PathBuf::from("."),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::EmptyUrl));
    }

    #[test]
    fn job_rejects_url_that_is_only_a_playlist_param() {
        let err = DownloadJob::new(
            "?list=PL123",
            OutputKind::Audio,
            VideoQuality::Best,
            AudioFormat::Ogg,
            PathBuf::from("."),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::EmptyUrl));
    }

    #[test]
    fn job_keeps_sanitized_url() {
        let job = DownloadJob::new(
            "https://www.youtube.com/watch?v=abc&list=PL1&index=3",
            OutputKind::Video,
            VideoQuality::P480,
            AudioFormat::Mp3,
            PathBuf::from("/tmp"),
            false,
        )
        .unwrap();
        assert_eq!(job.url, "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn config_labels_deserialize() {
        #[derive(Deserialize)]
        struct Row {
            q: VideoQuality,
            a: AudioFormat,
        }
        let row: Row = toml::from_str("q = \"1080p\"\na = \"OGG\"").unwrap();
        assert_eq!(row.q, VideoQuality::P1080);
        assert_eq!(row.a, AudioFormat::Ogg);
    }
}
