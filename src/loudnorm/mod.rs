//! Two-pass loudness normalization.
//!
//! Pass 1 ([`analyzer`]) measures the source; pass 2 ([`filter`]) derives a
//! correction filter from the measurements; the orchestrator here injects
//! that filter into an already-built encode command. Normalization is
//! strictly best-effort: every failure degrades to "no normalization
//! applied" and the caller always receives a usable command.

pub mod analyzer;
pub mod cache;
pub mod filter;
pub mod progress;

pub use analyzer::{analyze_two_pass, AnalysisOptions};
pub use cache::{InMemoryLoudnessCache, LoudnessCache};
pub use filter::{
    build_analysis_filter, build_pass2_filter, build_replaygain_filter, format_num,
    LoudnormMeasurements, LoudnormTargets,
};

use crate::command::EncodeCommand;
use crate::config::{NormalizationMethod, TranscoderConfig, DEFAULT_TARGET_LUFS};
use crate::error::Result;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Analysis never gets more than this, whatever the transcode budget is.
const MAX_ANALYSIS_TIMEOUT: u64 = 300;

/// Per-invocation context for the orchestrator.
pub struct NormalizationRequest<'a> {
    /// Source media path, analyzed in pass 1.
    pub input: &'a Path,
    /// Whether the base command stream-copies audio; filters cannot apply.
    pub stream_copy: bool,
    /// Known media duration for progress reporting.
    pub duration_seconds: Option<f64>,
    /// Measurements from a prior pass, skipping re-analysis.
    pub precomputed: Option<&'a LoudnormMeasurements>,
    /// Performance cache collaborator.
    pub cache: Option<&'a dyn LoudnessCache>,
}

impl<'a> NormalizationRequest<'a> {
    /// A request with only the input path set.
    pub fn new(input: &'a Path) -> Self {
        Self {
            input,
            stream_copy: false,
            duration_seconds: None,
            precomputed: None,
            cache: None,
        }
    }
}

/// Inject the configured normalization into `base` when possible.
///
/// Returns the base command unchanged, without raising, when normalization
/// is disabled, incompatible with the request, or fails at any step; those
/// are logged, never fatal to the transcode.
pub fn apply_normalization(
    base: EncodeCommand,
    cfg: &TranscoderConfig,
    req: &NormalizationRequest<'_>,
) -> EncodeCommand {
    let norm = &cfg.audio.normalization;

    if !norm.enabled {
        return base;
    }

    if req.stream_copy {
        // Stream copy cannot be combined with filters.
        debug!("normalization requested but stream copy is enabled; skipping");
        return base;
    }

    match norm.method {
        NormalizationMethod::Loudnorm => match loudnorm_filter(cfg, req) {
            Ok(filter) => {
                info!("applying loudnorm normalization (pass 2)");
                base.inject_before_output("-af", filter)
            }
            Err(e) => {
                warn!("normalization failed; continuing without it: {e}");
                base
            }
        },
        NormalizationMethod::Replaygain => {
            if matches!(
                req.input
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase())
                    .as_deref(),
                Some("m4a") | Some("mp4") | Some("aac")
            ) {
                warn!("ReplayGain tags on AAC/M4A may not be honored by all players");
            }
            info!("applying ReplayGain tagging");
            base.inject_before_output("-af", build_replaygain_filter())
        }
        NormalizationMethod::None | NormalizationMethod::Unknown => {
            warn!("unrecognized or absent normalization method; skipping");
            base
        }
    }
}

/// Resolve targets, run (or reuse) pass 1, and build the pass-2 filter.
fn loudnorm_filter(cfg: &TranscoderConfig, req: &NormalizationRequest<'_>) -> Result<String> {
    let norm = &cfg.audio.normalization;

    let targets = if norm.use_default_targets {
        info!(
            "using default loudnorm targets: I={DEFAULT_TARGET_LUFS} LUFS \
(TP/LRA omitted to use ffmpeg defaults)"
        );
        LoudnormTargets::integrated(DEFAULT_TARGET_LUFS)
    } else {
        info!(
            "using custom loudnorm targets: I={} LUFS, TP={} dBTP, LRA={} LU",
            norm.target_i, norm.true_peak, norm.loudness_range
        );
        LoudnormTargets {
            integrated_lufs: norm.target_i,
            true_peak_dbtp: Some(norm.true_peak),
            lra_lu: Some(norm.loudness_range),
        }
    };

    let meas = match req.precomputed {
        Some(meas) => {
            info!("using precomputed loudnorm measurements");
            meas.clone()
        }
        None => {
            let timeout = cfg.general.timeout_seconds.min(MAX_ANALYSIS_TIMEOUT);
            let opts = AnalysisOptions {
                timeout: Duration::from_secs(timeout),
                duration_seconds: req.duration_seconds,
                cache: req.cache,
            };
            analyze_two_pass(req.input, &targets, &opts)?
        }
    };

    Ok(build_pass2_filter(&targets, &meas))
}
