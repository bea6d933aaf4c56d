//! Stream descriptor types.
//!
//! A [`StreamInfo`] summarizes one probed media file. It is produced by an
//! external prober (ffprobe or equivalent) and is read-only input here:
//! command builders branch on it but never mutate it.

use serde::{Deserialize, Serialize};

/// Probed attributes of a media file's primary streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Codec name of the primary video stream, or of the audio stream for
    /// audio-only files (e.g. "h264", "vp9", "aac").
    pub codec_name: String,
    /// Pixel format of the video stream (e.g. "yuv420p").
    #[serde(default)]
    pub pixel_format: Option<String>,
    /// Codec profile if reported (e.g. "High", "Main").
    #[serde(default)]
    pub profile: Option<String>,
    /// Codec name of the primary audio stream, if any.
    #[serde(default)]
    pub audio_codec: Option<String>,
    /// Audio channel count.
    #[serde(default)]
    pub channels: Option<u32>,
    /// Audio sample rate in Hz.
    #[serde(default)]
    pub sample_rate_hz: Option<u32>,
    /// Audio bit rate in kbps.
    #[serde(default)]
    pub bitrate_kbps: Option<u32>,
    /// Whether the file contains an audio stream.
    pub has_audio: bool,
    /// Whether the file contains a video stream.
    pub has_video: bool,
    /// Container duration in seconds, when the prober reported one.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl StreamInfo {
    /// True if the media appears to be audio-only.
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}
