//! Codec capability registry and command-builder dispatch.
//!
//! Each supported codec is a variant of [`VideoCodec`] or [`AudioCodec`];
//! the variant's methods expose its capabilities, compatibility predicate,
//! and command builder. [`CodecRegistry::new`] builds the immutable
//! name-to-variant lookup once at startup; there is no global registration
//! side effect, so lookup results never depend on load order.

pub mod audio;
pub mod video;

use crate::command::EncodeCommand;
use crate::config::TranscoderConfig;
use crate::error::Result;
use crate::hwaccel::HwContext;
use crate::probe::StreamInfo;
use std::collections::HashMap;
use std::path::Path;

/// Describes a video codec handler's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecCapabilities {
    /// Registry key, e.g. "h264".
    pub name: &'static str,
    /// Human-readable name, e.g. "H.264/AVC".
    pub display_name: &'static str,
    /// Default container extension (no leading dot).
    pub container: &'static str,
    /// Whether a QSV encoder exists for this codec.
    pub hw_encode: bool,
    /// Whether a QSV decoder exists for this codec.
    pub hw_decode: bool,
    /// Whether the embedding player can play this codec natively.
    pub playback_compatible: bool,
}

/// Describes an audio codec handler's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCodecCapabilities {
    /// Registry key, e.g. "mp3".
    pub name: &'static str,
    /// Human-readable name, e.g. "MP3 (LAME)".
    pub display_name: &'static str,
    /// Default container extension (no leading dot).
    pub container: &'static str,
    /// Accepted output extensions (no leading dot).
    pub extensions: &'static [&'static str],
}

/// Supported video encode targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    H264,
    Vp8,
    Hevc,
    Vp9,
    Av1,
}

impl VideoCodec {
    /// Every registered video codec.
    pub const ALL: [VideoCodec; 5] = [
        VideoCodec::H264,
        VideoCodec::Vp8,
        VideoCodec::Hevc,
        VideoCodec::Vp9,
        VideoCodec::Av1,
    ];

    /// This codec's capabilities.
    pub fn capabilities(self) -> CodecCapabilities {
        video::capabilities(self)
    }

    /// Whether the probed stream is already in this codec's target format,
    /// making a re-encode unnecessary.
    pub fn is_compatible(self, stream: &StreamInfo) -> bool {
        video::is_compatible(self, stream)
    }

    /// Build the full encode invocation for this codec.
    ///
    /// Pure: identical inputs (including the hardware context's accelerator
    /// answer and encoder inventory) always produce identical token
    /// sequences.
    #[allow(clippy::too_many_arguments)]
    pub fn build_encode_command(
        self,
        input: &Path,
        output: &Path,
        stream: &StreamInfo,
        cfg: &TranscoderConfig,
        hw: &HwContext<'_>,
        hw_encode_enabled: bool,
        hw_decode_enabled: bool,
    ) -> EncodeCommand {
        video::build_encode_command(
            self,
            input,
            output,
            stream,
            cfg,
            hw,
            hw_encode_enabled,
            hw_decode_enabled,
        )
    }
}

/// Supported audio-only encode targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Mp3,
    Vorbis,
    Aac,
    Opus,
}

impl AudioCodec {
    /// Every registered audio codec.
    pub const ALL: [AudioCodec; 4] = [
        AudioCodec::Mp3,
        AudioCodec::Vorbis,
        AudioCodec::Aac,
        AudioCodec::Opus,
    ];

    /// This codec's capabilities.
    pub fn capabilities(self) -> AudioCodecCapabilities {
        audio::capabilities(self)
    }

    /// Validate the codec's quality parameter range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending parameter. Runs
    /// before any command is assembled so violations never reach a spawn.
    pub fn validate_config(self, cfg: &TranscoderConfig) -> Result<()> {
        audio::validate_config(self, cfg)
    }

    /// Whether the path's extension is in this codec's accepted set.
    pub fn container_compatible(self, path: &Path) -> bool {
        audio::container_compatible(self, path)
    }

    /// Build the audio-only encode invocation for this codec.
    ///
    /// # Errors
    ///
    /// Fails fast on out-of-range quality parameters or an output extension
    /// outside the codec's accepted set.
    pub fn build_encode_command(
        self,
        input: &Path,
        output: &Path,
        cfg: &TranscoderConfig,
        stream_copy: bool,
    ) -> Result<EncodeCommand> {
        audio::build_encode_command(self, input, output, cfg, stream_copy)
    }
}

/// Immutable codec lookup, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    video: HashMap<&'static str, VideoCodec>,
    audio: HashMap<&'static str, AudioCodec>,
}

impl CodecRegistry {
    /// Build the registry from the fixed variant sets.
    pub fn new() -> Self {
        let video = VideoCodec::ALL
            .iter()
            .map(|&c| (c.capabilities().name, c))
            .collect();
        let audio = AudioCodec::ALL
            .iter()
            .map(|&c| (c.capabilities().name, c))
            .collect();
        Self { video, audio }
    }

    /// Resolve a video codec by registry name.
    pub fn video(&self, name: &str) -> Option<VideoCodec> {
        self.video.get(name).copied()
    }

    /// Resolve an audio codec by registry name.
    pub fn audio(&self, name: &str) -> Option<AudioCodec> {
        self.audio.get(name).copied()
    }

    /// Registered video codecs.
    pub fn video_codecs(&self) -> impl Iterator<Item = VideoCodec> + '_ {
        self.video.values().copied()
    }

    /// Registered audio codecs.
    pub fn audio_codecs(&self) -> impl Iterator<Item = AudioCodec> + '_ {
        self.audio.values().copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
