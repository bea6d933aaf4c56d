//! Hardware acceleration context.
//!
//! The crate owns a static mapping from input codec to QSV decoder name;
//! whether that decoder is actually usable on the running machine is the
//! accelerator collaborator's call. Device discovery lives in the embedding
//! application, behind [`HardwareAccelerator`].

use crate::probe::StreamInfo;
use crate::tools::EncoderInventory;

/// Static QSV decoder lookup for a detected input codec.
pub fn quicksync_decoder(codec_name: &str) -> Option<&'static str> {
    match codec_name.to_ascii_lowercase().as_str() {
        "h264" => Some("h264_qsv"),
        "hevc" | "h265" => Some("hevc_qsv"),
        "vp9" => Some("vp9_qsv"),
        "mpeg2video" => Some("mpeg2_qsv"),
        "vc1" => Some("vc1_qsv"),
        "av1" => Some("av1_qsv"),
        "mjpeg" => Some("mjpeg_qsv"),
        _ => None,
    }
}

/// Selects the concrete hardware decoder for a probed stream.
///
/// Decoder selection must come from the accelerator, not the static table
/// alone; future accelerators (NVDEC, VideoToolbox, VAAPI) answer for their
/// own device families.
pub trait HardwareAccelerator: Send + Sync {
    /// Return the decoder name to use for this stream, or None to decode in
    /// software.
    fn decoder_for(&self, stream: &StreamInfo) -> Option<String>;
}

/// Intel Quick Sync accelerator backed by the static decoder table.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickSyncAccelerator;

impl HardwareAccelerator for QuickSyncAccelerator {
    fn decoder_for(&self, stream: &StreamInfo) -> Option<String> {
        quicksync_decoder(&stream.codec_name).map(str::to_string)
    }
}

/// Hardware and encoder availability supplied to command builders.
///
/// Carrying availability as an input keeps builders deterministic: the same
/// context always yields the same token sequence.
pub struct HwContext<'a> {
    /// The selected accelerator, or None when no device is usable.
    pub accel: Option<&'a dyn HardwareAccelerator>,
    /// Encoders offered by the local ffmpeg build.
    pub encoders: &'a EncoderInventory,
}

impl<'a> HwContext<'a> {
    /// Context with an accelerator present.
    pub fn new(accel: &'a dyn HardwareAccelerator, encoders: &'a EncoderInventory) -> Self {
        Self {
            accel: Some(accel),
            encoders,
        }
    }

    /// Context without any accelerator; hardware paths are never taken.
    pub fn software_only(encoders: &'a EncoderInventory) -> Self {
        Self {
            accel: None,
            encoders,
        }
    }

    /// Whether an accelerator is present.
    pub fn has_accel(&self) -> bool {
        self.accel.is_some()
    }

    /// The hardware decoder for this stream, or None when no accelerator is
    /// present or it declines the stream.
    pub fn decoder_for(&self, stream: &StreamInfo) -> Option<String> {
        self.accel.and_then(|a| a.decoder_for(stream))
    }
}
