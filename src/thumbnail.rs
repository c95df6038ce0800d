use eframe::egui::ColorImage;

/// Downloads and decodes the preview image for a YouTube video id.
/// Blocking; run it on a blocking task.
pub fn fetch_thumbnail(video_id: &str) -> Option<ColorImage> {
    let url = format!("https://img.youtube.com/vi/{}/mqdefault.jpg", video_id);
    let resp = match reqwest::blocking::get(&url).and_then(|r| r.error_for_status()) {
        Ok(resp) => resp,
        Err(err) => {
            tracing::debug!("thumbnail request for {video_id} failed: {err}");
            return None;
        }
    };
    let bytes = resp.bytes().ok()?;
    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img.to_rgba8(),
        Err(err) => {
            tracing::debug!("thumbnail for {video_id} did not decode: {err}");
            return None;
        }
    };
    let size = [img.width() as usize, img.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &img))
}
