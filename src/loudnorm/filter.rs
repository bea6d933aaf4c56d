//! Loudnorm filter construction and measurement extraction.
//!
//! Pass 1 runs `loudnorm=...:print_format=json` and ffmpeg prints a JSON
//! object (usually across several lines) on stderr. Pass 2 re-runs the
//! filter with the measured values appended so the correction is applied in
//! one encode.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Caller-facing loudnorm targets.
///
/// Only the integrated target is mandatory; omitted true-peak and
/// loudness-range targets let ffmpeg apply its own defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnormTargets {
    /// Integrated loudness target in LUFS.
    pub integrated_lufs: f64,
    /// True peak target in dBTP.
    pub true_peak_dbtp: Option<f64>,
    /// Loudness range target in LU.
    pub lra_lu: Option<f64>,
}

impl LoudnormTargets {
    /// Targets with only the integrated loudness pinned.
    pub fn integrated(integrated_lufs: f64) -> Self {
        Self {
            integrated_lufs,
            true_peak_dbtp: None,
            lra_lu: None,
        }
    }
}

/// Measurements extracted from loudnorm pass 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnormMeasurements {
    /// Measured integrated loudness in LUFS.
    pub measured_i: f64,
    /// Measured true peak in dBTP.
    pub measured_tp: f64,
    /// Measured loudness range in LU.
    pub measured_lra: f64,
    /// Measured threshold in LUFS.
    pub measured_thresh: f64,
    /// Target offset in LU.
    pub offset: f64,
    /// The raw JSON block the measurements were taken from.
    pub raw: Map<String, Value>,
}

/// Format a float for ffmpeg filter arguments.
///
/// Three decimals, then trailing zeros and a trailing point stripped, so
/// equal values always render to the same compact token.
pub fn format_num(value: f64) -> String {
    if !value.is_finite() {
        // Never passed to ffmpeg; guard anyway.
        return "0".to_string();
    }
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

fn targets_prefix(targets: &LoudnormTargets) -> String {
    let mut s = format!("loudnorm=I={}:", format_num(targets.integrated_lufs));
    if let Some(tp) = targets.true_peak_dbtp {
        s.push_str(&format!("TP={}:", format_num(tp)));
    }
    if let Some(lra) = targets.lra_lu {
        s.push_str(&format!("LRA={}:", format_num(lra)));
    }
    s
}

/// Build the pass-1 analysis filter with machine-readable output.
pub fn build_analysis_filter(targets: &LoudnormTargets) -> String {
    let mut s = targets_prefix(targets);
    s.push_str("print_format=json");
    s
}

/// Build the pass-2 correction filter from targets and measurements.
pub fn build_pass2_filter(targets: &LoudnormTargets, meas: &LoudnormMeasurements) -> String {
    let mut s = targets_prefix(targets);
    s.push_str(&format!(
        "measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}",
        format_num(meas.measured_i),
        format_num(meas.measured_tp),
        format_num(meas.measured_lra),
        format_num(meas.measured_thresh),
        format_num(meas.offset),
    ));
    s
}

/// Build a ReplayGain tagging filter.
///
/// Writes tags on output for containers that support them.
pub fn build_replaygain_filter() -> String {
    "replaygain".to_string()
}

fn brace_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*?\}").expect("static regex"))
}

/// Extract the authoritative loudnorm JSON block from captured stderr.
///
/// Multiple blocks may appear (ffmpeg can print more than one, and other
/// filters emit brace-delimited text); the LAST block carrying all four
/// measurement keys wins.
///
/// # Errors
///
/// Returns a parse error when no qualifying block is present.
pub fn parse_loudnorm_output(stderr_text: &str) -> Result<Map<String, Value>> {
    let mut last_good: Option<Map<String, Value>> = None;

    for m in brace_block_re().find_iter(stderr_text) {
        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(m.as_str()) else {
            continue;
        };
        if ["input_i", "input_tp", "input_lra", "input_thresh"]
            .iter()
            .all(|k| obj.contains_key(*k))
        {
            last_good = Some(obj);
        }
    }

    last_good.ok_or_else(|| {
        Error::parse("ffmpeg", "could not locate loudnorm JSON output in stderr")
    })
}

/// Map the loudnorm JSON block into validated pass-2 measurements.
///
/// ffmpeg reports the values as strings; any field that is missing,
/// non-numeric, or non-finite is named in the resulting error.
pub fn extract_measurements(obj: Map<String, Value>) -> Result<LoudnormMeasurements> {
    let fields = [
        ("measured_I", "input_i"),
        ("measured_TP", "input_tp"),
        ("measured_LRA", "input_lra"),
        ("measured_thresh", "input_thresh"),
        ("offset", "target_offset"),
    ];

    let mut values = [0.0f64; 5];
    let mut bad: Vec<&str> = Vec::new();
    for (slot, (name, key)) in values.iter_mut().zip(fields) {
        match obj.get(key).and_then(as_finite) {
            Some(v) => *slot = v,
            None => bad.push(name),
        }
    }

    if !bad.is_empty() {
        return Err(Error::InvalidMeasurements {
            fields: bad.join(", "),
        });
    }

    let [measured_i, measured_tp, measured_lra, measured_thresh, offset] = values;
    Ok(LoudnormMeasurements {
        measured_i,
        measured_tp,
        measured_lra,
        measured_thresh,
        offset,
        raw: obj,
    })
}

fn as_finite(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_measurements() -> LoudnormMeasurements {
        LoudnormMeasurements {
            measured_i: -20.2,
            measured_tp: -3.1,
            measured_lra: 7.4,
            measured_thresh: -30.2,
            offset: 3.8,
            raw: Map::new(),
        }
    }

    #[test]
    fn test_format_num() {
        assert_eq!(format_num(128.0), "128");
        assert_eq!(format_num(-1.5), "-1.5");
        assert_eq!(format_num(-20.2), "-20.2");
        assert_eq!(format_num(0.125), "0.125");
        assert_eq!(format_num(f64::NAN), "0");
    }

    #[test]
    fn test_analysis_filter_minimal_targets() {
        let targets = LoudnormTargets::integrated(-16.0);
        assert_eq!(build_analysis_filter(&targets), "loudnorm=I=-16:print_format=json");
    }

    #[test]
    fn test_analysis_filter_full_targets() {
        let targets = LoudnormTargets {
            integrated_lufs: -14.0,
            true_peak_dbtp: Some(-1.5),
            lra_lu: Some(11.0),
        };
        assert_eq!(
            build_analysis_filter(&targets),
            "loudnorm=I=-14:TP=-1.5:LRA=11:print_format=json"
        );
    }

    #[test]
    fn test_pass2_filter_exact_rendering() {
        let targets = LoudnormTargets::integrated(-16.0);
        let filter = build_pass2_filter(&targets, &sample_measurements());
        assert_eq!(
            filter,
            "loudnorm=I=-16:measured_I=-20.2:measured_TP=-3.1:measured_LRA=7.4:\
measured_thresh=-30.2:offset=3.8"
        );
    }

    #[test]
    fn test_parse_picks_last_qualifying_block() {
        let stderr = r#"
[Parsed_loudnorm_0 @ 0x1] {
  "input_i" : "-23.5",
  "input_tp" : "-4.0",
  "input_lra" : "6.0",
  "input_thresh" : "-33.5",
  "target_offset" : "1.0"
}
frame= 100
{
  "input_i" : "-20.20",
  "input_tp" : "-3.10",
  "input_lra" : "7.40",
  "input_thresh" : "-30.20",
  "target_offset" : "3.80"
}
"#;
        let obj = parse_loudnorm_output(stderr).unwrap();
        assert_eq!(obj["input_i"], Value::String("-20.20".into()));
    }

    #[test]
    fn test_parse_ignores_non_json_braces() {
        let stderr = "size={not json} {\"input_i\": \"-20\", \"input_tp\": \"-3\", \
\"input_lra\": \"7\", \"input_thresh\": \"-30\", \"target_offset\": \"0.5\"}";
        let obj = parse_loudnorm_output(stderr).unwrap();
        assert_eq!(obj["input_thresh"], Value::String("-30".into()));
    }

    #[test]
    fn test_parse_no_block_is_error() {
        let err = parse_loudnorm_output("frame= 100 fps= 25").unwrap_err();
        assert_matches!(err, Error::Parse { .. });
    }

    #[test]
    fn test_extract_valid_measurements() {
        let obj = parse_loudnorm_output(
            r#"{"input_i": "-20.2", "input_tp": "-3.1", "input_lra": "7.4",
                "input_thresh": "-30.2", "target_offset": "3.8"}"#,
        )
        .unwrap();
        let meas = extract_measurements(obj).unwrap();
        assert_eq!(meas.measured_i, -20.2);
        assert_eq!(meas.offset, 3.8);
    }

    #[test]
    fn test_extract_names_invalid_fields() {
        let obj = parse_loudnorm_output(
            r#"{"input_i": "-inf", "input_tp": "-3.1", "input_lra": "7.4",
                "input_thresh": "-30.2"}"#,
        )
        .unwrap();
        let err = extract_measurements(obj).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidMeasurements { fields }
                if fields.contains("measured_I") && fields.contains("offset")
        );
    }

    #[test]
    fn test_extract_accepts_numeric_values() {
        let obj: Map<String, Value> = serde_json::from_str(
            r#"{"input_i": -20.2, "input_tp": -3.1, "input_lra": 7.4,
                "input_thresh": -30.2, "target_offset": 3.8}"#,
        )
        .unwrap();
        let meas = extract_measurements(obj).unwrap();
        assert_eq!(meas.measured_tp, -3.1);
    }
}
