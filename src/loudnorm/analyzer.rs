//! Loudnorm pass-1 analysis.
//!
//! Spawns ffmpeg with the analysis filter, discards its primary output, and
//! streams stderr through a reader thread onto a channel. The controller
//! loop selects between the next line, the wall-clock timeout, and process
//! exit, so a stalled process cannot hold the analysis past its bound.

use crate::error::{Error, Result};
use crate::tools::require_tool;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::cache::LoudnessCache;
use super::filter::{
    build_analysis_filter, extract_measurements, parse_loudnorm_output, LoudnormMeasurements,
    LoudnormTargets,
};
use super::progress::{format_seconds, parse_progress_line, ProgressTracker};

/// Granular progress is only worth reporting for inputs longer than this.
const PROGRESS_MIN_DURATION: f64 = 30.0;

/// Durations at or below this are too short for a meaningful cache sample.
const CACHE_MIN_DURATION: f64 = 5.0;

/// How long a terminated process gets to exit before being killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Options for one analysis run.
pub struct AnalysisOptions<'a> {
    /// Wall-clock bound for the whole analysis.
    pub timeout: Duration,
    /// Known media duration; enables incremental progress reporting.
    pub duration_seconds: Option<f64>,
    /// Performance cache to record (duration, wall-clock) pairs into.
    pub cache: Option<&'a dyn LoudnessCache>,
}

impl Default for AnalysisOptions<'_> {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            duration_seconds: None,
            cache: None,
        }
    }
}

/// Run loudnorm pass 1 and return the measurements for pass 2.
///
/// # Errors
///
/// Fails when ffmpeg is missing, exits non-zero (carrying the last ~1000
/// characters of its stderr), exceeds the timeout, or produces no
/// qualifying measurement block.
pub fn analyze_two_pass(
    input: &Path,
    targets: &LoudnormTargets,
    opts: &AnalysisOptions<'_>,
) -> Result<LoudnormMeasurements> {
    require_tool("ffmpeg")?;

    let filter = build_analysis_filter(targets);
    let args: [String; 15] = [
        "-hide_banner",
        "-stats",
        "-y",
        "-i",
        &input.display().to_string(),
        "-map",
        "0:a:0?",
        "-vn",
        "-sn",
        "-dn",
        "-af",
        &filter,
        "-f",
        "null",
        "-",
    ]
    .map(String::from);

    info!(
        "running loudnorm analysis (pass 1): target I={} LUFS, TP={:?} dBTP, LRA={:?} LU",
        targets.integrated_lufs, targets.true_peak_dbtp, targets.lra_lu
    );
    debug!("ffmpeg {}", args.join(" "));

    let start = Instant::now();
    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::process_failed("ffmpeg", None, "failed to open stderr pipe"))?;

    // Reader thread feeds the channel until EOF; dropping the sender tells
    // the controller the stream ended.
    let (tx, rx) = mpsc::channel::<String>();
    let reader = thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut lines: Vec<String> = Vec::new();
    let mut tracker = ProgressTracker::new();

    loop {
        if start.elapsed() > opts.timeout {
            terminate(&mut child);
            let _ = reader.join();
            return Err(Error::timeout("ffmpeg", opts.timeout.as_secs()));
        }

        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(line) => {
                if let Some(duration) = known_duration(opts) {
                    report_progress(&line, duration, start.elapsed(), &mut tracker);
                }
                lines.push(line);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = reader.join();
    let status = child.wait()?;
    let wall_seconds = start.elapsed().as_secs_f64();
    let stderr_text = lines.join("\n");

    if !status.success() {
        let tail = tail_chars(stderr_text.trim(), 1000);
        return Err(Error::process_failed("ffmpeg", status.code(), tail));
    }

    // Completion is never silent, even when the input was too short for
    // granular progress.
    if let Some(duration) = opts.duration_seconds {
        if duration > 0.0 && wall_seconds > 0.0 {
            info!(
                "loudnorm analysis completed in {wall_seconds:.1}s ({:.1}x realtime)",
                duration / wall_seconds
            );
        }
    }

    let obj = parse_loudnorm_output(&stderr_text)?;
    let meas = extract_measurements(obj)?;

    info!(
        "loudnorm measurements: I={} LUFS, TP={} dBTP, LRA={} LU, thresh={} LUFS, offset={}",
        meas.measured_i, meas.measured_tp, meas.measured_lra, meas.measured_thresh, meas.offset
    );

    if let Some(cache) = opts.cache {
        if let Some(duration) = raw_duration(&meas) {
            if duration > CACHE_MIN_DURATION {
                cache.record_analysis(duration, wall_seconds);
            }
        }
    }

    Ok(meas)
}

fn known_duration(opts: &AnalysisOptions<'_>) -> Option<f64> {
    opts.duration_seconds.filter(|d| *d > PROGRESS_MIN_DURATION)
}

fn report_progress(line: &str, duration: f64, elapsed: Duration, tracker: &mut ProgressTracker) {
    if !line.contains("time=") {
        return;
    }
    let Some(sample) = parse_progress_line(line) else {
        return;
    };
    let percent = sample.position_seconds / duration * 100.0;
    if tracker.observe(percent, elapsed) {
        info!(
            "loudnorm analysis: {percent:.0}% complete ({} / {}) [speed={}]",
            format_seconds(sample.position_seconds),
            format_seconds(duration),
            sample.speed.as_deref().unwrap_or("?")
        );
    }
}

/// Ask the process to exit, then kill it after the grace period.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM);
        let deadline = Instant::now() + TERMINATE_GRACE;
        while Instant::now() < deadline {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(Duration::from_millis(100)),
                Err(_) => break,
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}

fn raw_duration(meas: &LoudnormMeasurements) -> Option<f64> {
    let value = meas.raw.get("duration")?;
    value
        .as_f64()
        .or_else(|| value.as_str()?.trim().parse().ok())
        .filter(|d| d.is_finite())
}

fn tail_chars(text: &str, n: usize) -> String {
    let count = text.chars().count();
    if count <= n {
        text.to_string()
    } else {
        text.chars().skip(count - n).collect()
    }
}
