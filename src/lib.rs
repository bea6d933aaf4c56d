//! # mediaforge
//!
//! FFmpeg command synthesis and two-pass loudness normalization for media
//! transcoding pipelines.
//!
//! This crate provides functionality for:
//! - Building deterministic, hardware-aware ffmpeg argument sequences per
//!   codec (H.264, VP8, HEVC, VP9, AV1, MP3, Vorbis, AAC, Opus)
//! - Two-pass EBU R128 loudness normalization: driving the analysis pass,
//!   parsing its streamed output, and injecting the correction filter
//!
//! It never executes the commands it builds (apart from the bounded
//! analysis pass); spawning the final transcode and escaping arguments is
//! the embedding application's job.
//!
//! ## Example
//!
//! ```no_run
//! use mediaforge::{CodecRegistry, HwContext, EncoderInventory, TranscoderConfig};
//! use mediaforge::loudnorm::{apply_normalization, NormalizationRequest};
//! use std::path::Path;
//!
//! # fn probe(_: &Path) -> mediaforge::StreamInfo { unimplemented!() }
//! let registry = CodecRegistry::new();
//! let encoders = EncoderInventory::detect();
//! let hw = HwContext::software_only(&encoders);
//! let cfg = TranscoderConfig::default();
//!
//! let input = Path::new("/media/song.mp4");
//! let output = Path::new("/media/out.mp4");
//! let stream = probe(input);
//!
//! let codec = registry.video("h264").expect("registered");
//! let cmd = codec.build_encode_command(input, output, &stream, &cfg, &hw, false, false);
//! let cmd = apply_normalization(cmd, &cfg, &NormalizationRequest::new(input));
//! println!("{cmd}");
//! ```

mod command;
mod error;

pub mod codec;
pub mod config;
pub mod hwaccel;
pub mod loudnorm;
pub mod probe;
pub mod tools;

// Re-exports
pub use codec::{
    AudioCodec, AudioCodecCapabilities, CodecCapabilities, CodecRegistry, VideoCodec,
};
pub use command::EncodeCommand;
pub use config::{NormalizationConfig, NormalizationMethod, TranscoderConfig};
pub use error::{Error, Result};
pub use hwaccel::{HardwareAccelerator, HwContext, QuickSyncAccelerator};
pub use loudnorm::{LoudnormMeasurements, LoudnormTargets};
pub use probe::StreamInfo;
pub use tools::EncoderInventory;
