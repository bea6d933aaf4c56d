//! Audio-only encode command builders.
//!
//! Audio builders serve standalone audio inputs and audio extraction from
//! video containers. They select the first audio stream if present
//! (tolerating its absence), disable video/subtitle/data muxing, and fail
//! fast on out-of-range quality parameters before assembling any tokens.

use crate::command::EncodeCommand;
use crate::config::TranscoderConfig;
use crate::error::{Error, Result};
use std::path::Path;

use super::{AudioCodec, AudioCodecCapabilities};

pub(super) fn capabilities(codec: AudioCodec) -> AudioCodecCapabilities {
    match codec {
        AudioCodec::Mp3 => AudioCodecCapabilities {
            name: "mp3",
            display_name: "MP3 (LAME)",
            container: "mp3",
            extensions: &["mp3"],
        },
        AudioCodec::Vorbis => AudioCodecCapabilities {
            name: "vorbis",
            display_name: "Ogg Vorbis",
            container: "ogg",
            extensions: &["ogg"],
        },
        AudioCodec::Aac => AudioCodecCapabilities {
            name: "aac",
            display_name: "AAC (M4A)",
            container: "m4a",
            // mp4 is accepted for AAC stream-copy operations.
            extensions: &["m4a", "mp4"],
        },
        AudioCodec::Opus => AudioCodecCapabilities {
            name: "opus",
            display_name: "Opus",
            container: "opus",
            extensions: &["opus"],
        },
    }
}

pub(super) fn validate_config(codec: AudioCodec, cfg: &TranscoderConfig) -> Result<()> {
    let audio = &cfg.audio;
    match codec {
        AudioCodec::Mp3 => ensure_range("mp3_quality", f64::from(audio.mp3_quality), 0.0, 9.0),
        AudioCodec::Vorbis => ensure_range("vorbis_quality", audio.vorbis_quality, -1.0, 10.0),
        AudioCodec::Aac => ensure_range("aac_vbr_mode", f64::from(audio.aac_vbr_mode), 1.0, 5.0),
        AudioCodec::Opus => ensure_range(
            "opus_bitrate_kbps",
            f64::from(audio.opus_bitrate_kbps),
            6.0,
            510.0,
        ),
    }
}

pub(super) fn container_compatible(codec: AudioCodec, path: &Path) -> bool {
    let caps = capabilities(codec);
    match extension_of(path) {
        Some(ext) => caps.extensions.contains(&ext.as_str()),
        None => false,
    }
}

pub(super) fn build_encode_command(
    codec: AudioCodec,
    input: &Path,
    output: &Path,
    cfg: &TranscoderConfig,
    stream_copy: bool,
) -> Result<EncodeCommand> {
    validate_config(codec, cfg)?;
    check_extension(codec, output)?;

    let mut cmd = common_prefix(input);
    if stream_copy {
        cmd.args(["-c:a", "copy"]);
    } else {
        let audio = &cfg.audio;
        match codec {
            AudioCodec::Mp3 => {
                cmd.args(["-c:a", "libmp3lame", "-q:a", &audio.mp3_quality.to_string()]);
            }
            AudioCodec::Vorbis => {
                cmd.args(["-c:a", "libvorbis", "-q:a", &audio.vorbis_quality.to_string()]);
            }
            AudioCodec::Aac => {
                cmd.args(["-c:a", "aac", "-vbr", &audio.aac_vbr_mode.to_string()]);
            }
            AudioCodec::Opus => {
                cmd.args([
                    "-c:a",
                    "libopus",
                    "-b:a",
                    &format!("{}k", audio.opus_bitrate_kbps),
                ]);
            }
        }
    }

    if is_mp4_family(output) {
        cmd.args(["-movflags", "+faststart"]);
    }

    cmd.path(output);
    Ok(cmd)
}

/// Shared prefix for audio-only outputs.
///
/// `-map 0:a:0?` selects the first audio stream when present and keeps
/// ffmpeg from hard-failing on containers without one.
fn common_prefix(input: &Path) -> EncodeCommand {
    let mut cmd = EncodeCommand::ffmpeg();
    cmd.arg("-i")
        .path(input)
        .args(["-map", "0:a:0?", "-vn", "-sn", "-dn"]);
    cmd
}

fn ensure_range(name: &str, value: f64, low: f64, high: f64) -> Result<()> {
    if value < low || value > high {
        return Err(Error::configuration(format!(
            "{name} must be between {low} and {high} (got {value})"
        )));
    }
    Ok(())
}

fn check_extension(codec: AudioCodec, output: &Path) -> Result<()> {
    let caps = capabilities(codec);
    let ext = extension_of(output).unwrap_or_default();
    if !caps.extensions.contains(&ext.as_str()) {
        return Err(Error::unsupported_extension(caps.display_name, ext));
    }
    Ok(())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn is_mp4_family(output: &Path) -> bool {
    matches!(
        extension_of(output).as_deref(),
        Some("m4a") | Some("mp4") | Some("mov")
    )
}
