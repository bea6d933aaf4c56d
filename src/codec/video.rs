//! Video encode command builders.
//!
//! One builder per codec, all following the same template: invocation
//! header, optional hardware decoder, input, encoder selection, frame
//! timing, rate caps, filter chain, audio handling, container flags,
//! output. Builders are pure; everything they branch on arrives as an
//! argument.

use crate::command::EncodeCommand;
use crate::config::TranscoderConfig;
use crate::hwaccel::HwContext;
use crate::probe::StreamInfo;
use std::path::Path;

use super::{CodecCapabilities, VideoCodec};

/// Audio codecs that MP4-family containers carry without re-encoding.
const MP4_NATIVE_AUDIO: [&str; 3] = ["aac", "mp3", "alac"];

/// Audio codecs that WebM/MKV-family containers carry without re-encoding.
const WEBM_NATIVE_AUDIO: [&str; 2] = ["opus", "vorbis"];

pub(super) fn capabilities(codec: VideoCodec) -> CodecCapabilities {
    match codec {
        VideoCodec::H264 => CodecCapabilities {
            name: "h264",
            display_name: "H.264/AVC",
            container: "mp4",
            hw_encode: true,
            hw_decode: true,
            playback_compatible: true,
        },
        VideoCodec::Vp8 => CodecCapabilities {
            name: "vp8",
            display_name: "VP8",
            container: "webm",
            hw_encode: false,
            hw_decode: false,
            playback_compatible: true,
        },
        VideoCodec::Hevc => CodecCapabilities {
            name: "hevc",
            display_name: "HEVC/H.265",
            container: "mp4",
            hw_encode: true,
            hw_decode: true,
            playback_compatible: true,
        },
        VideoCodec::Vp9 => CodecCapabilities {
            name: "vp9",
            display_name: "VP9",
            container: "webm",
            hw_encode: true,
            hw_decode: true,
            playback_compatible: false,
        },
        VideoCodec::Av1 => CodecCapabilities {
            name: "av1",
            display_name: "AV1",
            container: "mkv",
            hw_encode: true,
            hw_decode: true,
            playback_compatible: false,
        },
    }
}

pub(super) fn is_compatible(codec: VideoCodec, stream: &StreamInfo) -> bool {
    let name = stream.codec_name.to_ascii_lowercase();
    match codec {
        VideoCodec::H264 => {
            if name != "h264" && name != "avc" {
                return false;
            }
            if stream.pixel_format.as_deref() != Some("yuv420p") {
                return false;
            }
            match stream.profile.as_deref() {
                None => true,
                Some(p) => matches!(
                    p.to_ascii_lowercase().as_str(),
                    "baseline" | "main" | "high"
                ),
            }
        }
        VideoCodec::Hevc => {
            (name == "hevc" || name == "h265")
                && stream.pixel_format.as_deref() == Some("yuv420p")
        }
        VideoCodec::Vp8 => name == "vp8",
        VideoCodec::Vp9 => name == "vp9",
        VideoCodec::Av1 => name == "av1",
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn build_encode_command(
    codec: VideoCodec,
    input: &Path,
    output: &Path,
    stream: &StreamInfo,
    cfg: &TranscoderConfig,
    hw: &HwContext<'_>,
    hw_encode_enabled: bool,
    hw_decode_enabled: bool,
) -> EncodeCommand {
    let mut cmd = EncodeCommand::ffmpeg();

    if hw_decode_enabled {
        if let Some(decoder) = hw.decoder_for(stream) {
            cmd.args(["-c:v", &decoder]);
        }
    }

    cmd.arg("-i").path(input);

    push_encoder_args(&mut cmd, codec, cfg, hw, hw_encode_enabled);

    // Normalize frame timing to constant frame rate.
    cmd.args(["-vsync", "cfr"]);

    push_rate_caps(&mut cmd, cfg);
    push_video_filters(&mut cmd, codec, cfg);
    push_audio_args(&mut cmd, codec, stream, output);

    if is_mp4_family(output) {
        cmd.args(["-movflags", "+faststart"]);
    }

    cmd.path(output);
    cmd
}

fn push_encoder_args(
    cmd: &mut EncodeCommand,
    codec: VideoCodec,
    cfg: &TranscoderConfig,
    hw: &HwContext<'_>,
    hw_encode_enabled: bool,
) {
    let hw_encode = hw_encode_enabled && hw.has_accel();
    match codec {
        VideoCodec::H264 => {
            let h264 = &cfg.h264;
            if hw_encode {
                cmd.args([
                    "-c:v",
                    "h264_qsv",
                    "-preset",
                    &h264.preset,
                    "-profile:v",
                    &h264.profile,
                    "-global_quality",
                    &h264.crf.to_string(),
                    "-look_ahead",
                    "1",
                    "-pix_fmt",
                    "nv12",
                ]);
            } else {
                cmd.args([
                    "-c:v",
                    "libx264",
                    "-preset",
                    &h264.preset,
                    "-profile:v",
                    &h264.profile,
                    "-crf",
                    &h264.crf.to_string(),
                    "-pix_fmt",
                    &h264.pixel_format,
                ]);
            }
        }
        VideoCodec::Vp8 => {
            let vp8 = &cfg.vp8;
            cmd.args([
                "-c:v",
                "libvpx",
                "-crf",
                &vp8.crf.to_string(),
                "-b:v",
                "0",
                "-cpu-used",
                &vp8.cpu_used.to_string(),
                "-deadline",
                "good",
                "-auto-alt-ref",
                "1",
                "-lag-in-frames",
                "16",
                "-pix_fmt",
                "yuv420p",
            ]);
        }
        VideoCodec::Hevc => {
            let hevc = &cfg.hevc;
            if hw_encode {
                cmd.args([
                    "-c:v",
                    "hevc_qsv",
                    "-preset",
                    &hevc.preset,
                    "-profile:v",
                    &hevc.profile,
                    "-global_quality",
                    &hevc.crf.to_string(),
                    "-rc_mode",
                    "icq",
                    "-pix_fmt",
                    "nv12",
                ]);
            } else {
                cmd.args([
                    "-c:v",
                    "libx265",
                    "-preset",
                    &hevc.preset,
                    "-profile:v",
                    &hevc.profile,
                    "-crf",
                    &hevc.crf.to_string(),
                    "-tag:v",
                    "hvc1",
                    "-pix_fmt",
                    &hevc.pixel_format,
                ]);
            }
        }
        VideoCodec::Vp9 => {
            let vp9 = &cfg.vp9;
            if hw_encode {
                cmd.args([
                    "-c:v",
                    "vp9_qsv",
                    "-global_quality",
                    &vp9.crf.to_string(),
                    "-pix_fmt",
                    "nv12",
                ]);
            } else {
                cmd.args([
                    "-c:v",
                    "libvpx-vp9",
                    "-crf",
                    &vp9.crf.to_string(),
                    "-b:v",
                    "0",
                    "-deadline",
                    &vp9.deadline,
                    "-cpu-used",
                    &vp9.cpu_used.to_string(),
                    "-row-mt",
                    "1",
                    "-tile-columns",
                    "2",
                    "-g",
                    "240",
                    "-pix_fmt",
                    "yuv420p",
                ]);
            }
        }
        VideoCodec::Av1 => {
            let av1 = &cfg.av1;
            if hw_encode {
                cmd.args([
                    "-c:v",
                    "av1_qsv",
                    "-rc_mode",
                    "icq",
                    "-global_quality",
                    &av1.crf.to_string(),
                    "-pix_fmt",
                    "nv12",
                ]);
            } else if hw.encoders.contains("libsvtav1") {
                cmd.args([
                    "-c:v",
                    "libsvtav1",
                    "-crf",
                    &av1.crf.to_string(),
                    "-preset",
                    &av1.cpu_used.to_string(),
                    "-g",
                    "240",
                    "-pix_fmt",
                    "yuv420p10le",
                ]);
            } else if hw.encoders.contains("libaom-av1") {
                cmd.args([
                    "-c:v",
                    "libaom-av1",
                    "-crf",
                    &av1.crf.to_string(),
                    "-cpu-used",
                    &av1.cpu_used.to_string(),
                    "-g",
                    "240",
                    "-pix_fmt",
                    "yuv420p10le",
                ]);
            } else {
                cmd.args(["-c:v", "av1"]);
            }
        }
    }
}

fn push_rate_caps(cmd: &mut EncodeCommand, cfg: &TranscoderConfig) {
    if let Some(max_k) = cfg.general.max_bitrate_kbps {
        cmd.args([
            "-maxrate",
            &format!("{max_k}k"),
            "-bufsize",
            &format!("{}k", max_k * 2),
        ]);
    }
}

fn push_video_filters(cmd: &mut EncodeCommand, codec: VideoCodec, cfg: &TranscoderConfig) {
    let mut vf: Vec<String> = Vec::new();

    if let Some((max_w, max_h)) = cfg.general.max_resolution {
        // VP9/AV1 always fit within bounds; the MP4/WebM playback targets
        // optionally letterbox to exact bounds instead.
        let preserve = cfg.general.preserve_source_resolution
            || matches!(codec, VideoCodec::Vp9 | VideoCodec::Av1);
        if preserve {
            vf.push(format!(
                "scale='min(iw,{max_w})':'min(ih,{max_h})':force_original_aspect_ratio=decrease"
            ));
        } else {
            vf.push(format!(
                "scale={max_w}:{max_h}:force_original_aspect_ratio=decrease,\
pad={max_w}:{max_h}:(ow-iw)/2:(oh-ih)/2"
            ));
        }
    }

    if let Some(max_fps) = cfg.general.max_fps {
        vf.push(format!("fps=fps={max_fps}"));
    }

    if !vf.is_empty() {
        cmd.args(["-vf", &vf.join(",")]);
    }
}

fn push_audio_args(cmd: &mut EncodeCommand, codec: VideoCodec, stream: &StreamInfo, output: &Path) {
    if !stream.has_audio {
        cmd.arg("-an");
        return;
    }

    // AV1 targets MKV by default but may be muxed into MP4; pick the audio
    // family by the actual output container.
    let mp4_family = match codec {
        VideoCodec::H264 | VideoCodec::Hevc => true,
        VideoCodec::Vp8 | VideoCodec::Vp9 => false,
        VideoCodec::Av1 => is_mp4_family(output),
    };

    let audio_codec = stream
        .audio_codec
        .as_deref()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if mp4_family {
        if MP4_NATIVE_AUDIO.contains(&audio_codec.as_str()) {
            cmd.args(["-c:a", "copy"]);
        } else {
            cmd.args(["-c:a", "aac", "-b:a", "192k"]);
        }
    } else if WEBM_NATIVE_AUDIO.contains(&audio_codec.as_str()) {
        cmd.args(["-c:a", "copy"]);
    } else {
        cmd.args(["-c:a", "libopus", "-b:a", "160k"]);
    }
}

fn is_mp4_family(output: &Path) -> bool {
    matches!(
        output
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref(),
        Some("mp4") | Some("mov")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hwaccel::QuickSyncAccelerator;
    use crate::tools::EncoderInventory;
    use std::path::PathBuf;

    fn stream(codec: &str, audio: Option<&str>) -> StreamInfo {
        StreamInfo {
            codec_name: codec.into(),
            pixel_format: Some("yuv420p".into()),
            profile: Some("High".into()),
            audio_codec: audio.map(Into::into),
            channels: audio.map(|_| 2),
            sample_rate_hz: audio.map(|_| 48000),
            bitrate_kbps: None,
            has_audio: audio.is_some(),
            has_video: true,
            duration_seconds: Some(180.0),
        }
    }

    fn paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("/in/src.mkv"), PathBuf::from("/out/dst.mp4"))
    }

    #[test]
    fn test_h264_compatibility() {
        let mut s = stream("h264", None);
        assert!(is_compatible(VideoCodec::H264, &s));

        s.pixel_format = Some("yuv422p".into());
        assert!(!is_compatible(VideoCodec::H264, &s));

        s.pixel_format = Some("yuv420p".into());
        s.profile = Some("High 4:4:4".into());
        assert!(!is_compatible(VideoCodec::H264, &s));

        s.profile = None;
        assert!(is_compatible(VideoCodec::H264, &s));

        s.codec_name = "mpeg4".into();
        assert!(!is_compatible(VideoCodec::H264, &s));
    }

    #[test]
    fn test_hevc_compatibility_ignores_profile() {
        let mut s = stream("hevc", None);
        s.profile = Some("Main 10".into());
        assert!(is_compatible(VideoCodec::Hevc, &s));
        s.pixel_format = Some("yuv420p10le".into());
        assert!(!is_compatible(VideoCodec::Hevc, &s));
    }

    #[test]
    fn test_name_only_compatibility() {
        assert!(is_compatible(VideoCodec::Vp9, &stream("vp9", None)));
        assert!(!is_compatible(VideoCodec::Vp9, &stream("vp8", None)));
        assert!(is_compatible(VideoCodec::Av1, &stream("AV1", None)));
    }

    #[test]
    fn test_h264_software_command_shape() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("mpeg4", Some("aac")),
            &cfg,
            &hw,
            false,
            false,
        );

        let tokens = cmd.tokens();
        assert_eq!(&tokens[..3], &["ffmpeg", "-y", "-hide_banner"]);
        assert_eq!(cmd.output_token(), Some("/out/dst.mp4"));
        assert!(tokens.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(tokens.windows(2).any(|w| w == ["-vsync", "cfr"]));
        assert!(tokens.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert!(tokens.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    }

    #[test]
    fn test_builders_are_deterministic() {
        let (input, output) = paths();
        let inv = EncoderInventory::from_names(["libsvtav1"]);
        let accel = QuickSyncAccelerator;
        let hw = HwContext::new(&accel, &inv);
        let cfg = TranscoderConfig::default();
        let s = stream("h264", Some("flac"));

        for codec in VideoCodec::ALL {
            let a = build_encode_command(codec, &input, &output, &s, &cfg, &hw, true, true);
            let b = build_encode_command(codec, &input, &output, &s, &cfg, &hw, true, true);
            assert_eq!(a, b, "{codec:?} must be deterministic");
        }
    }

    #[test]
    fn test_hw_decoder_emitted_before_input() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let accel = QuickSyncAccelerator;
        let hw = HwContext::new(&accel, &inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("hevc", None),
            &cfg,
            &hw,
            false,
            true,
        );

        let tokens = cmd.tokens();
        let decoder_at = tokens.iter().position(|t| t == "hevc_qsv").unwrap();
        let input_at = tokens.iter().position(|t| t == "-i").unwrap();
        assert!(decoder_at < input_at);
    }

    #[test]
    fn test_no_accel_means_no_hw_decoder() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("hevc", None),
            &cfg,
            &hw,
            false,
            true,
        );
        assert!(!cmd.tokens().iter().any(|t| t == "hevc_qsv"));
    }

    #[test]
    fn test_hw_encode_uses_global_quality() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let accel = QuickSyncAccelerator;
        let hw = HwContext::new(&accel, &inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::Hevc,
            &input,
            &output,
            &stream("h264", None),
            &cfg,
            &hw,
            true,
            false,
        );

        let tokens = cmd.tokens();
        assert!(tokens.windows(2).any(|w| w == ["-c:v", "hevc_qsv"]));
        assert!(tokens.windows(2).any(|w| w == ["-rc_mode", "icq"]));
        assert!(tokens.windows(2).any(|w| w == ["-pix_fmt", "nv12"]));
        assert!(!tokens.iter().any(|t| t == "-crf"));
    }

    #[test]
    fn test_rate_caps_bufsize_is_double() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let mut cfg = TranscoderConfig::default();
        cfg.general.max_bitrate_kbps = Some(4000);
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("h264", None),
            &cfg,
            &hw,
            false,
            false,
        );

        let tokens = cmd.tokens();
        assert!(tokens.windows(2).any(|w| w == ["-maxrate", "4000k"]));
        assert!(tokens.windows(2).any(|w| w == ["-bufsize", "8000k"]));
    }

    #[test]
    fn test_filter_chain_comma_joined() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let mut cfg = TranscoderConfig::default();
        cfg.general.max_resolution = Some((1920, 1080));
        cfg.general.max_fps = Some(30);
        cfg.general.preserve_source_resolution = true;
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("h264", None),
            &cfg,
            &hw,
            false,
            false,
        );

        let tokens = cmd.tokens();
        let vf_at = tokens.iter().position(|t| t == "-vf").unwrap();
        assert_eq!(
            tokens[vf_at + 1],
            "scale='min(iw,1920)':'min(ih,1080)':force_original_aspect_ratio=decrease,fps=fps=30"
        );
    }

    #[test]
    fn test_pad_mode_scale() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let mut cfg = TranscoderConfig::default();
        cfg.general.max_resolution = Some((1280, 720));
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("h264", None),
            &cfg,
            &hw,
            false,
            false,
        );

        let tokens = cmd.tokens();
        let vf_at = tokens.iter().position(|t| t == "-vf").unwrap();
        assert_eq!(
            tokens[vf_at + 1],
            "scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2"
        );
    }

    #[test]
    fn test_no_audio_disables_audio() {
        let (input, output) = paths();
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::H264,
            &input,
            &output,
            &stream("h264", None),
            &cfg,
            &hw,
            false,
            false,
        );
        assert!(cmd.tokens().iter().any(|t| t == "-an"));
    }

    #[test]
    fn test_webm_audio_fallback_is_opus() {
        let input = PathBuf::from("/in/src.mkv");
        let output = PathBuf::from("/out/dst.webm");
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let cfg = TranscoderConfig::default();
        let cmd = build_encode_command(
            VideoCodec::Vp9,
            &input,
            &output,
            &stream("h264", Some("aac")),
            &cfg,
            &hw,
            false,
            false,
        );

        let tokens = cmd.tokens();
        assert!(tokens.windows(2).any(|w| w == ["-c:a", "libopus"]));
        assert!(tokens.windows(2).any(|w| w == ["-b:a", "160k"]));
        assert!(!tokens.iter().any(|t| t == "-movflags"));
    }

    #[test]
    fn test_av1_audio_family_follows_extension() {
        let input = PathBuf::from("/in/src.mkv");
        let inv = EncoderInventory::default();
        let hw = HwContext::software_only(&inv);
        let cfg = TranscoderConfig::default();
        let s = stream("h264", Some("vorbis"));

        let mkv = build_encode_command(
            VideoCodec::Av1,
            &input,
            &PathBuf::from("/out/dst.mkv"),
            &s,
            &cfg,
            &hw,
            false,
            false,
        );
        assert!(mkv.tokens().windows(2).any(|w| w == ["-c:a", "copy"]));

        let mp4 = build_encode_command(
            VideoCodec::Av1,
            &input,
            &PathBuf::from("/out/dst.mp4"),
            &s,
            &cfg,
            &hw,
            false,
            false,
        );
        assert!(mp4.tokens().windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(mp4.tokens().windows(2).any(|w| w == ["-movflags", "+faststart"]));
    }

    #[test]
    fn test_av1_software_encoder_preference() {
        let (input, _) = paths();
        let output = PathBuf::from("/out/dst.mkv");
        let cfg = TranscoderConfig::default();
        let s = stream("h264", None);

        let svt = EncoderInventory::from_names(["libsvtav1", "libaom-av1"]);
        let hw = HwContext::software_only(&svt);
        let cmd = build_encode_command(VideoCodec::Av1, &input, &output, &s, &cfg, &hw, false, false);
        assert!(cmd.tokens().windows(2).any(|w| w == ["-c:v", "libsvtav1"]));

        let aom = EncoderInventory::from_names(["libaom-av1"]);
        let hw = HwContext::software_only(&aom);
        let cmd = build_encode_command(VideoCodec::Av1, &input, &output, &s, &cfg, &hw, false, false);
        assert!(cmd.tokens().windows(2).any(|w| w == ["-c:v", "libaom-av1"]));

        let none = EncoderInventory::default();
        let hw = HwContext::software_only(&none);
        let cmd = build_encode_command(VideoCodec::Av1, &input, &output, &s, &cfg, &hw, false, false);
        assert!(cmd.tokens().windows(2).any(|w| w == ["-c:v", "av1"]));
    }
}
