//! Stream encoder boundary and codec selection.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Codec/container pairs, from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 in MP4. No transparency.
    H264,
    /// VP9 in WebM (supports transparency).
    Vp9,
    /// VP8 in WebM. No transparency.
    Vp8,
    /// ProRes 4444 in QuickTime (supports transparency).
    #[serde(rename = "prores")]
    ProRes4444,
    /// Animated GIF with one-bit transparency.
    Gif,
}

impl VideoCodec {
    /// Default preference, best first.
    pub const PREFERENCE: [VideoCodec; 5] = [
        VideoCodec::H264,
        VideoCodec::Vp9,
        VideoCodec::Vp8,
        VideoCodec::ProRes4444,
        VideoCodec::Gif,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "mp4",
            VideoCodec::Vp9 | VideoCodec::Vp8 => "webm",
            VideoCodec::ProRes4444 => "mov",
            VideoCodec::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "video/mp4;codecs=h264",
            VideoCodec::Vp9 => "video/webm;codecs=vp9",
            VideoCodec::Vp8 => "video/webm;codecs=vp8",
            VideoCodec::ProRes4444 => "video/quicktime",
            VideoCodec::Gif => "image/gif",
        }
    }

    pub fn supports_alpha(&self) -> bool {
        matches!(self, VideoCodec::Vp9 | VideoCodec::ProRes4444 | VideoCodec::Gif)
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VideoCodec::H264 => "H.264",
            VideoCodec::Vp9 => "VP9",
            VideoCodec::Vp8 => "VP8",
            VideoCodec::ProRes4444 => "ProRes 4444",
            VideoCodec::Gif => "GIF",
        };
        f.write_str(name)
    }
}

/// Errors raised by encoder backends.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("codec not supported by this backend: {0}")]
    Unsupported(VideoCodec),
    #[error("frame is {got_width}x{got_height}, encoder expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
    #[error("encoding error: {0}")]
    Encode(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] rsmpeg::error::RsmpegError),
}

/// Everything an encoder needs to start a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    /// Target frame rate. Frames are encoded as produced, never time-warped.
    pub fps: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

/// One running encode.
pub trait StreamEncoder {
    fn settings(&self) -> &EncoderSettings;

    /// Encode one frame, returning whatever bytes became ready.
    fn encode(&mut self, frame: &RgbaImage) -> Result<Vec<u8>, EncoderError>;

    /// Flush and return the trailing bytes.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, EncoderError>;
}

/// A factory for stream encoders of the codecs it supports.
pub trait EncoderBackend {
    fn name(&self) -> &str;

    fn supports(&self, codec: VideoCodec) -> bool;

    fn start(&self, settings: &EncoderSettings) -> Result<Box<dyn StreamEncoder>, EncoderError>;
}

/// Candidate codecs for a capture, best first.
pub fn codec_candidates(preference: &[VideoCodec], transparent: bool) -> Vec<VideoCodec> {
    preference
        .iter()
        .copied()
        .filter(|codec| !transparent || codec.supports_alpha())
        .collect()
}

pub(crate) fn check_frame_size(settings: &EncoderSettings, frame: &RgbaImage) -> Result<(), EncoderError> {
    if frame.width() != settings.width || frame.height() != settings.height {
        return Err(EncoderError::FrameSize {
            width: settings.width,
            height: settings.height,
            got_width: frame.width(),
            got_height: frame.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_candidates_keep_alpha_codecs() {
        assert_eq!(
            codec_candidates(&VideoCodec::PREFERENCE, true),
            vec![VideoCodec::Vp9, VideoCodec::ProRes4444, VideoCodec::Gif]
        );
        assert_eq!(codec_candidates(&VideoCodec::PREFERENCE, false).len(), 5);
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(VideoCodec::ProRes4444.extension(), "mov");
        assert_eq!(VideoCodec::Vp8.extension(), "webm");
        assert_eq!(VideoCodec::H264.to_string(), "H.264");
        let codec: VideoCodec = serde_json::from_str("\"prores\"").unwrap();
        assert_eq!(codec, VideoCodec::ProRes4444);
    }
}
