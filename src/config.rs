//! Transcoder configuration types.
//!
//! Deserialized by the embedding application; every field carries a default
//! so partial config files work. Command builders treat the config as
//! immutable input.

use serde::{Deserialize, Serialize};

/// Integrated-loudness target used when the caller opts into defaults,
/// matching the EBU R128 reference level.
pub const DEFAULT_TARGET_LUFS: f64 = -23.0;

/// Top-level transcoder configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TranscoderConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub h264: H264Config,

    #[serde(default)]
    pub vp8: Vp8Config,

    #[serde(default)]
    pub hevc: HevcConfig,

    #[serde(default)]
    pub vp9: Vp9Config,

    #[serde(default)]
    pub av1: Av1Config,

    #[serde(default)]
    pub audio: AudioConfig,
}

/// Caps applied across all video codecs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Cap on the encoder's peak bitrate, in kbps. None = uncapped.
    #[serde(default)]
    pub max_bitrate_kbps: Option<u32>,

    /// Maximum output resolution as (width, height). None = unscaled.
    #[serde(default)]
    pub max_resolution: Option<(u32, u32)>,

    /// Maximum output frame rate. None = unchanged.
    #[serde(default)]
    pub max_fps: Option<u32>,

    /// When scaling, fit within the bounds and keep smaller sources at
    /// their native size instead of scaling to exact bounds with padding.
    #[serde(default)]
    pub preserve_source_resolution: bool,

    /// Overall per-invocation time bound in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    3600
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_bitrate_kbps: None,
            max_resolution: None,
            max_fps: None,
            preserve_source_resolution: false,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// H.264 encoder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct H264Config {
    #[serde(default = "default_h264_crf")]
    pub crf: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_h264_profile")]
    pub profile: String,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

fn default_h264_crf() -> u32 {
    23
}
fn default_preset() -> String {
    "medium".to_string()
}
fn default_h264_profile() -> String {
    "high".to_string()
}
fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

impl Default for H264Config {
    fn default() -> Self {
        Self {
            crf: default_h264_crf(),
            preset: default_preset(),
            profile: default_h264_profile(),
            pixel_format: default_pixel_format(),
        }
    }
}

/// VP8 encoder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Vp8Config {
    #[serde(default = "default_vp8_crf")]
    pub crf: u32,
    #[serde(default = "default_cpu_used")]
    pub cpu_used: u32,
}

fn default_vp8_crf() -> u32 {
    10
}
fn default_cpu_used() -> u32 {
    1
}

impl Default for Vp8Config {
    fn default() -> Self {
        Self {
            crf: default_vp8_crf(),
            cpu_used: default_cpu_used(),
        }
    }
}

/// HEVC encoder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HevcConfig {
    #[serde(default = "default_hevc_crf")]
    pub crf: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_hevc_profile")]
    pub profile: String,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

fn default_hevc_crf() -> u32 {
    28
}
fn default_hevc_profile() -> String {
    "main".to_string()
}

impl Default for HevcConfig {
    fn default() -> Self {
        Self {
            crf: default_hevc_crf(),
            preset: default_preset(),
            profile: default_hevc_profile(),
            pixel_format: default_pixel_format(),
        }
    }
}

/// VP9 encoder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Vp9Config {
    #[serde(default = "default_vp9_crf")]
    pub crf: u32,
    #[serde(default = "default_cpu_used")]
    pub cpu_used: u32,
    #[serde(default = "default_deadline")]
    pub deadline: String,
}

fn default_vp9_crf() -> u32 {
    31
}
fn default_deadline() -> String {
    "good".to_string()
}

impl Default for Vp9Config {
    fn default() -> Self {
        Self {
            crf: default_vp9_crf(),
            cpu_used: default_cpu_used(),
            deadline: default_deadline(),
        }
    }
}

/// AV1 encoder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Av1Config {
    #[serde(default = "default_av1_crf")]
    pub crf: u32,
    #[serde(default = "default_cpu_used")]
    pub cpu_used: u32,
}

fn default_av1_crf() -> u32 {
    30
}

impl Default for Av1Config {
    fn default() -> Self {
        Self {
            crf: default_av1_crf(),
            cpu_used: default_cpu_used(),
        }
    }
}

/// Audio codec quality knobs and normalization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// LAME VBR quality index, 0 (best) to 9 (worst).
    #[serde(default = "default_mp3_quality")]
    pub mp3_quality: u32,

    /// Vorbis quality, -1.0 to 10.0.
    #[serde(default = "default_vorbis_quality")]
    pub vorbis_quality: f64,

    /// Native AAC encoder VBR mode, 1 to 5.
    #[serde(default = "default_aac_vbr_mode")]
    pub aac_vbr_mode: u32,

    /// Opus target bitrate in kbps, 6 to 510.
    #[serde(default = "default_opus_bitrate")]
    pub opus_bitrate_kbps: u32,

    #[serde(default)]
    pub normalization: NormalizationConfig,
}

fn default_mp3_quality() -> u32 {
    2
}
fn default_vorbis_quality() -> f64 {
    5.0
}
fn default_aac_vbr_mode() -> u32 {
    4
}
fn default_opus_bitrate() -> u32 {
    160
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mp3_quality: default_mp3_quality(),
            vorbis_quality: default_vorbis_quality(),
            aac_vbr_mode: default_aac_vbr_mode(),
            opus_bitrate_kbps: default_opus_bitrate(),
            normalization: NormalizationConfig::default(),
        }
    }
}

/// Loudness normalization settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizationConfig {
    /// Master switch; when off the base command is used as-is.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub method: NormalizationMethod,

    /// Use the EBU R128 reference target and let ffmpeg pick TP/LRA,
    /// ignoring the explicit target fields below.
    #[serde(default)]
    pub use_default_targets: bool,

    /// Integrated loudness target in LUFS.
    #[serde(default = "default_target_i")]
    pub target_i: f64,

    /// True peak target in dBTP.
    #[serde(default = "default_true_peak")]
    pub true_peak: f64,

    /// Loudness range target in LU.
    #[serde(default = "default_loudness_range")]
    pub loudness_range: f64,
}

fn default_target_i() -> f64 {
    DEFAULT_TARGET_LUFS
}
fn default_true_peak() -> f64 {
    -2.0
}
fn default_loudness_range() -> f64 {
    7.0
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            method: NormalizationMethod::default(),
            use_default_targets: true,
            target_i: default_target_i(),
            true_peak: default_true_peak(),
            loudness_range: default_loudness_range(),
        }
    }
}

/// Normalization method selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMethod {
    /// No normalization.
    #[default]
    None,
    /// EBU R128 two-pass loudnorm.
    Loudnorm,
    /// ReplayGain tag writing.
    Replaygain,
    /// Any unrecognized method tag; treated as a skip, not an error.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TranscoderConfig::default();
        assert_eq!(cfg.h264.crf, 23);
        assert_eq!(cfg.h264.profile, "high");
        assert_eq!(cfg.hevc.profile, "main");
        assert_eq!(cfg.audio.opus_bitrate_kbps, 160);
        assert_eq!(cfg.general.timeout_seconds, 3600);
        assert!(!cfg.audio.normalization.enabled);
        assert_eq!(cfg.audio.normalization.method, NormalizationMethod::None);
    }

    #[test]
    fn test_unknown_method_tag_deserializes() {
        let cfg: NormalizationConfig =
            serde_json::from_str(r#"{"enabled": true, "method": "dynaudnorm"}"#).unwrap();
        assert_eq!(cfg.method, NormalizationMethod::Unknown);
    }

    #[test]
    fn test_partial_config_deserializes() {
        let cfg: TranscoderConfig =
            serde_json::from_str(r#"{"general": {"max_bitrate_kbps": 4000}}"#).unwrap();
        assert_eq!(cfg.general.max_bitrate_kbps, Some(4000));
        assert_eq!(cfg.vp9.deadline, "good");
    }
}
