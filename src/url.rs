//! URL clean-up done before a job is handed to yt-dlp.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DownloadError;

static PLAYLIST_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[&?](list|index)=[^&]+").expect("playlist parameter pattern is valid")
});

/// Strips `list=` and `index=` query parameters unless the whole playlist was
/// asked for. Only the matched `?key=value` / `&key=value` pieces are removed.
pub fn sanitize_url(url: &str, playlist: bool) -> String {
    if playlist {
        return url.to_owned();
    }
    PLAYLIST_PARAM.replace_all(url, "").into_owned()
}

/// Sanitizes and rejects URLs with nothing left to download.
pub fn validate_url(url: &str, playlist: bool) -> Result<String, DownloadError> {
    let url = sanitize_url(url, playlist);
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::EmptyUrl);
    }
    Ok(trimmed.to_owned())
}

/// Extracts the YouTube video id from `watch?v=`, `youtu.be/` or `/shorts/` links.
pub fn video_id(url: &str) -> Option<String> {
    let url = url.trim();
    let from_query = url.split_once('?').and_then(|(_, query)| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))
            .map(str::to_owned)
    });
    let id = from_query.or_else(|| {
        ["youtu.be/", "/shorts/"].iter().find_map(|marker| {
            url.split_once(marker)
                .map(|(_, rest)| rest.split(['?', '&', '/', '#']).next().unwrap_or("").to_owned())
        })
    })?;

    let valid = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_list_and_index_when_not_playlist() {
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc&index=2";
        assert_eq!(sanitize_url(url, false), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn leaves_other_params_alone() {
        let url = "https://www.youtube.com/watch?v=abc&list=PLx&t=42s";
        assert_eq!(sanitize_url(url, false), "https://www.youtube.com/watch?v=abc&t=42s");
    }

    #[test]
    fn removes_leading_list_param() {
        let url = "https://www.youtube.com/playlist?list=PLabc";
        assert_eq!(sanitize_url(url, false), "https://www.youtube.com/playlist");
    }

    #[test]
    fn does_not_touch_lookalike_keys() {
        let url = "https://example.com/watch?v=abc&playlist=1&pindex=4";
        assert_eq!(sanitize_url(url, false), url);
    }

    #[test]
    fn empty_values_are_not_matched() {
        let url = "https://www.youtube.com/watch?v=abc&list=";
        assert_eq!(sanitize_url(url, false), url);
    }

    #[test]
    fn playlist_mode_passes_through() {
        let url = "https://www.youtube.com/watch?v=abc&list=PLabc&index=7";
        assert_eq!(sanitize_url(url, true), url);
    }

    #[test]
    fn empty_and_blank_urls_rejected() {
        assert!(matches!(validate_url("", false), Err(DownloadError::EmptyUrl)));
        assert!(matches!(validate_url(" \t\n", true), Err(DownloadError::EmptyUrl)));
        assert!(matches!(validate_url("&list=PL1", false), Err(DownloadError::EmptyUrl)));
    }

    #[test]
    fn accepted_url_is_trimmed() {
        assert_eq!(
            validate_url("  https://youtu.be/abc  ", false).unwrap(),
            "https://youtu.be/abc"
        );
    }

    #[test]
    fn video_id_forms() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://www.youtube.com/watch?feature=share&v=abc_-1").as_deref(),
            Some("abc_-1")
        );
        assert_eq!(video_id("https://youtu.be/xyz123?si=foo").as_deref(), Some("xyz123"));
        assert_eq!(
            video_id("https://www.youtube.com/shorts/short1").as_deref(),
            Some("short1")
        );
        assert_eq!(video_id("https://www.youtube.com/playlist?list=PL1"), None);
        assert_eq!(video_id("https://vimeo.com/12345"), None);
    }
}
