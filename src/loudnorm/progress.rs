//! Analysis progress parsing and emission policy.
//!
//! ffmpeg's `-stats` output interleaves lines like
//! `size=N/A time=00:01:23.45 bitrate=N/A speed=41.2x` with the rest of its
//! stderr. Analysis can run much faster than realtime, so progress comes
//! from the reported media position, not wall-clock time.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// One parsed progress sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    /// Media position in seconds.
    pub position_seconds: f64,
    /// The reported processing speed (e.g. "41.2x"), verbatim.
    pub speed: Option<String>,
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("static regex"))
}

fn speed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"speed=\s*([\d.]+x?)").expect("static regex"))
}

/// Parse a stats line into a progress sample, if it carries a position.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let caps = time_re().captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let position_seconds = hours * 3600.0 + minutes * 60.0 + seconds;

    let speed = speed_re()
        .captures(line)
        .map(|c| c[1].to_string());

    Some(ProgressSample {
        position_seconds,
        speed,
    })
}

/// Render seconds as HH:MM:SS.
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Decides when a progress notification should fire.
///
/// Emits on each new 10%-boundary, and additionally whenever at least six
/// real seconds have passed since the last notification and the percentage
/// has advanced, so fast analyses don't spam and slow ones never look hung.
#[derive(Debug)]
pub struct ProgressTracker {
    last_percent: f64,
    last_emit: Option<Duration>,
}

impl ProgressTracker {
    const PERIODIC_INTERVAL: Duration = Duration::from_secs(6);

    pub fn new() -> Self {
        Self {
            // Start below zero so the first parsed position always emits.
            last_percent: -10.0,
            last_emit: None,
        }
    }

    /// Record a sample at `percent` complete with `elapsed` wall-clock time;
    /// returns true when a notification should fire.
    pub fn observe(&mut self, percent: f64, elapsed: Duration) -> bool {
        let crossed_bucket =
            (percent / 10.0).floor() as i64 > (self.last_percent / 10.0).floor() as i64;
        let periodic_due = match self.last_emit {
            Some(last) => elapsed.saturating_sub(last) >= Self::PERIODIC_INTERVAL,
            None => elapsed >= Self::PERIODIC_INTERVAL,
        } && percent > self.last_percent.max(0.0);

        if crossed_bucket || periodic_due {
            self.last_percent = self.last_percent.max(percent);
            self.last_emit = Some(elapsed);
            true
        } else {
            false
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
