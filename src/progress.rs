/// Prefix yt-dlp puts in front of every progress line we ask for
pub const PROGRESS_PREFIX: &str = "download:";

/// Value passed to `--progress-template`; fields are `NA` when yt-dlp does not know them
pub const PROGRESS_TEMPLATE: &str = "download:%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.total_bytes_estimate)s";

/// Byte counters from one progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTick {
    pub downloaded: u64,
    pub total: Option<u64>,
    pub estimate: Option<u64>,
}

impl ProgressTick {
    /// Exact size when known, otherwise yt-dlp's estimate.
    pub fn total(&self) -> Option<u64> {
        self.total.or(self.estimate)
    }

    pub fn percent(&self) -> Option<u8> {
        percent(self.downloaded, self.total())
    }
}

/// `floor(downloaded / total * 100)`, or `None` when the size is unknown.
pub fn percent(downloaded: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)?;
    let pct = (downloaded as u128 * 100) / total as u128;
    Some(pct.min(100) as u8)
}

pub fn parse_progress_line(line: &str) -> Option<ProgressTick> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split('/').map(parse_bytes);
    let downloaded = fields.next()??;
    let total = fields.next().flatten();
    let estimate = fields.next().flatten();
    Some(ProgressTick {
        downloaded,
        total,
        estimate,
    })
}

// Counters come as ints, estimates as floats, unknowns as "NA".
fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(v) = field.parse::<u64>() {
        return Some(v);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v.floor() as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_floors() {
        assert_eq!(percent(1, Some(3)), Some(33));
        assert_eq!(percent(2, Some(3)), Some(66));
        assert_eq!(percent(999, Some(1000)), Some(99));
        assert_eq!(percent(1000, Some(1000)), Some(100));
        assert_eq!(percent(0, Some(1000)), Some(0));
    }

    #[test]
    fn percent_needs_a_size() {
        assert_eq!(percent(500, None), None);
        assert_eq!(percent(500, Some(0)), None);
    }

    #[test]
    fn percent_caps_overshoot() {
        assert_eq!(percent(1_200, Some(1_000)), Some(100));
    }

    #[test]
    fn percent_handles_large_files() {
        let total = 40 * 1024 * 1024 * 1024_u64;
        assert_eq!(percent(total / 2, Some(total)), Some(50));
        assert_eq!(percent(u64::MAX - 1, Some(u64::MAX)), Some(99));
    }

    #[test]
    fn parses_exact_total() {
        let tick = parse_progress_line("download:1024/4096/NA").unwrap();
        assert_eq!(
            tick,
            ProgressTick {
                downloaded: 1024,
                total: Some(4096),
                estimate: None
            }
        );
        assert_eq!(tick.percent(), Some(25));
    }

    #[test]
    fn falls_back_to_estimate() {
        let tick = parse_progress_line("download:500/NA/1000.7").unwrap();
        assert_eq!(tick.total(), Some(1000));
        assert_eq!(tick.percent(), Some(50));
    }

    #[test]
    fn exact_total_wins_over_estimate() {
        let tick = parse_progress_line("download:50/100/400.0").unwrap();
        assert_eq!(tick.percent(), Some(50));
    }

    #[test]
    fn unknown_size_gives_no_percent() {
        let tick = parse_progress_line("download:123456/NA/NA").unwrap();
        assert_eq!(tick.percent(), None);
    }

    #[test]
    fn ignores_other_output() {
        assert_eq!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_progress_line("download:NA/NA/NA"), None);
        assert_eq!(parse_progress_line(""), None);
    }
}
