//! FFmpeg backend via rsmpeg (H.264, VP9, VP8, ProRes 4444).
//!
//! Each stream is muxed into a scratch file in append-only mode (fragmented
//! MP4/MOV, live Matroska, packets flushed as written). Whatever the muxer
//! appended is handed back from every `encode`, and the file is removed on
//! finish.

use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use log::{debug, warn};
use rsmpeg::{
    avcodec::{AVCodec, AVCodecContext},
    avformat::AVFormatContextOutput,
    avutil::{AVDictionary, AVFrame, AVRational},
    error::RsmpegError,
    ffi,
};

use super::encoder::{check_frame_size, EncoderBackend, EncoderError, EncoderSettings, StreamEncoder, VideoCodec};

static NEXT_SCRATCH: AtomicU64 = AtomicU64::new(0);

fn encoder_name(codec: VideoCodec) -> Option<&'static CStr> {
    match codec {
        VideoCodec::H264 => Some(c"libx264"),
        VideoCodec::Vp9 => Some(c"libvpx-vp9"),
        VideoCodec::Vp8 => Some(c"libvpx"),
        VideoCodec::ProRes4444 => Some(c"prores_ks"),
        VideoCodec::Gif => None,
    }
}

fn pixel_format(codec: VideoCodec) -> ffi::AVPixelFormat {
    match codec {
        VideoCodec::ProRes4444 => ffi::AV_PIX_FMT_YUVA444P10LE,
        VideoCodec::Vp9 => ffi::AV_PIX_FMT_YUVA420P,
        _ => ffi::AV_PIX_FMT_YUV420P,
    }
}

fn set_option(codec_ctx: &mut AVCodecContext, key: &CStr, value: &str) -> Result<(), EncoderError> {
    let value = CString::new(value).map_err(|e| EncoderError::Encode(e.to_string()))?;
    unsafe {
        ffi::av_opt_set(
            codec_ctx.as_mut_ptr() as *mut _,
            key.as_ptr(),
            value.as_ptr(),
            ffi::AV_OPT_SEARCH_CHILDREN as i32,
        );
    }
    Ok(())
}

/// Encodes through system FFmpeg libraries.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    scratch_dir: PathBuf,
    /// Constant rate factor for H.264 and VP9. `None` encodes by bitrate alone.
    crf: Option<u32>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            crf: Some(18),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_crf(mut self, crf: Option<u32>) -> Self {
        self.crf = crf;
        self
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn supports(&self, codec: VideoCodec) -> bool {
        encoder_name(codec).is_some_and(|name| AVCodec::find_encoder_by_name(name).is_some())
    }

    fn start(&self, settings: &EncoderSettings) -> Result<Box<dyn StreamEncoder>, EncoderError> {
        let name = encoder_name(settings.codec).ok_or(EncoderError::Unsupported(settings.codec))?;
        let codec = AVCodec::find_encoder_by_name(name).ok_or(EncoderError::Unsupported(settings.codec))?;

        let path = self.scratch_dir.join(format!(
            "music-visualizer-{}-{}.{}",
            std::process::id(),
            NEXT_SCRATCH.fetch_add(1, Ordering::Relaxed),
            settings.codec.extension()
        ));
        let path_cstring = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|e| EncoderError::Encode(e.to_string()))?;
        let mut format_ctx = AVFormatContextOutput::create(&path_cstring)?;

        let mut codec_ctx = AVCodecContext::new(&codec);
        codec_ctx.set_width(settings.width as i32);
        codec_ctx.set_height(settings.height as i32);
        codec_ctx.set_pix_fmt(pixel_format(settings.codec));
        codec_ctx.set_time_base(AVRational {
            num: 1,
            den: settings.fps as i32,
        });
        codec_ctx.set_framerate(AVRational {
            num: settings.fps as i32,
            den: 1,
        });

        // A keyframe every second closes a fragment every second
        set_option(&mut codec_ctx, c"g", &settings.fps.max(1).to_string())?;

        match settings.codec {
            VideoCodec::H264 => {
                codec_ctx.set_bit_rate(settings.bitrate as i64);
                if let Some(crf) = self.crf {
                    set_option(&mut codec_ctx, c"crf", &crf.to_string())?;
                    set_option(&mut codec_ctx, c"preset", "medium")?;
                }
            }
            VideoCodec::Vp9 => {
                codec_ctx.set_bit_rate(settings.bitrate as i64);
                if let Some(crf) = self.crf {
                    set_option(&mut codec_ctx, c"crf", &crf.to_string())?;
                }
            }
            VideoCodec::Vp8 => codec_ctx.set_bit_rate(settings.bitrate as i64),
            // Profile 4 is ProRes 4444
            VideoCodec::ProRes4444 => set_option(&mut codec_ctx, c"profile", "4")?,
            VideoCodec::Gif => return Err(EncoderError::Unsupported(settings.codec)),
        }

        codec_ctx.open(None)?;

        let stream_index = {
            let mut stream = format_ctx.new_stream();
            stream.set_codecpar(codec_ctx.extract_codecpar());
            stream.set_time_base(codec_ctx.time_base);
            stream.index
        };
        let mut muxer_options = Some(append_only_options());
        format_ctx.write_header(&mut muxer_options)?;

        let mut frame = AVFrame::new();
        frame.set_format(pixel_format(settings.codec));
        frame.set_width(settings.width as i32);
        frame.set_height(settings.height as i32);
        frame.alloc_buffer()?;

        debug!("ffmpeg stream started: {} -> {}", settings.codec, path.display());
        Ok(Box::new(FfmpegStream {
            format_ctx,
            codec_ctx,
            frame,
            pts: 0,
            stream_index,
            path,
            emitted: 0,
            settings: settings.clone(),
        }))
    }
}

struct FfmpegStream {
    format_ctx: AVFormatContextOutput,
    codec_ctx: AVCodecContext,
    frame: AVFrame,
    pts: i64,
    stream_index: i32,
    path: PathBuf,
    /// Bytes of the scratch file already handed out.
    emitted: u64,
    settings: EncoderSettings,
}

/// Muxer options that keep every container writing strictly forward.
fn append_only_options() -> AVDictionary {
    AVDictionary::new(c"movflags", c"frag_keyframe+empty_moov+default_base_moof", 0)
        .set(c"live", c"1", 0)
        .set(c"flush_packets", c"1", 0)
}

impl FfmpegStream {
    /// Bytes appended to the scratch file since the last call.
    fn take_written(&mut self) -> Result<Vec<u8>, EncoderError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.emitted))?;
        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk)?;
        self.emitted += chunk.len() as u64;
        Ok(chunk)
    }

    /// Write every packet the codec has ready.
    fn drain_packets(&mut self) -> Result<(), EncoderError> {
        let stream_time_base = self
            .format_ctx
            .streams()
            .get(self.stream_index as usize)
            .map(|s| s.time_base)
            .ok_or_else(|| EncoderError::Encode("output stream missing".into()))?;

        loop {
            let mut packet = match self.codec_ctx.receive_packet() {
                Ok(p) => p,
                Err(RsmpegError::EncoderDrainError) | Err(RsmpegError::EncoderFlushedError) => break,
                Err(e) => return Err(e.into()),
            };
            packet.set_stream_index(self.stream_index);
            packet.rescale_ts(self.codec_ctx.time_base, stream_time_base);
            self.format_ctx.interleaved_write_frame(&mut packet)?;
        }
        Ok(())
    }

    fn fill_frame(&mut self, rgba: &[u8]) {
        let width = self.settings.width as usize;
        let height = self.settings.height as usize;
        match self.settings.codec {
            VideoCodec::ProRes4444 => self.fill_yuva444p10(rgba, width, height),
            VideoCodec::Vp9 => self.fill_yuv420p(rgba, width, height, true),
            _ => self.fill_yuv420p(rgba, width, height, false),
        }
    }

    fn fill_yuv420p(&mut self, rgba: &[u8], width: usize, height: usize, alpha: bool) {
        let planes = self.frame.data;
        let strides = self.frame.linesize;

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * 4;
                let r = rgba[idx] as f32;
                let g = rgba[idx + 1] as f32;
                let b = rgba[idx + 2] as f32;

                // BT.601
                let luma = (0.299 * r + 0.587 * g + 0.114 * b) as u8;
                unsafe {
                    *planes[0].add(y * strides[0] as usize + x) = luma;
                    if alpha {
                        *planes[3].add(y * strides[3] as usize + x) = rgba[idx + 3];
                    }
                }

                if x % 2 == 0 && y % 2 == 0 {
                    let u = (128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b) as u8;
                    let v = (128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b) as u8;
                    unsafe {
                        *planes[1].add((y / 2) * strides[1] as usize + x / 2) = u;
                        *planes[2].add((y / 2) * strides[2] as usize + x / 2) = v;
                    }
                }
            }
        }
    }

    fn fill_yuva444p10(&mut self, rgba: &[u8], width: usize, height: usize) {
        let planes = self.frame.data.map(|p| p as *mut u16);
        let strides = self.frame.linesize.map(|s| s as usize / 2);
        let scale = 1023.0 / 255.0;

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * 4;
                let r = rgba[idx] as f32;
                let g = rgba[idx + 1] as f32;
                let b = rgba[idx + 2] as f32;
                let a = rgba[idx + 3] as f32;

                let values = [
                    (0.299 * r + 0.587 * g + 0.114 * b) * scale,
                    (128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b) * scale,
                    (128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b) * scale,
                    a * scale,
                ];
                for (plane, value) in values.into_iter().enumerate() {
                    unsafe {
                        *planes[plane].add(y * strides[plane] + x) = value as u16;
                    }
                }
            }
        }
    }
}

impl StreamEncoder for FfmpegStream {
    fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    fn encode(&mut self, frame: &RgbaImage) -> Result<Vec<u8>, EncoderError> {
        check_frame_size(&self.settings, frame)?;
        self.fill_frame(frame.as_raw());
        self.frame.set_pts(self.pts);
        self.pts += 1;

        self.codec_ctx.send_frame(Some(&self.frame))?;
        self.drain_packets()?;
        self.take_written()
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, EncoderError> {
        self.codec_ctx.send_frame(None)?;
        self.drain_packets()?;
        self.format_ctx.write_trailer()?;

        let bytes = self.take_written()?;
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("could not remove scratch file {}: {}", self.path.display(), e);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gif_is_left_to_the_gif_backend() {
        assert!(!FfmpegBackend::new().supports(VideoCodec::Gif));
    }

    #[test]
    fn test_encode_h264_stream() {
        let scratch = TempDir::new().unwrap();
        let backend = FfmpegBackend::new().with_scratch_dir(scratch.path()).with_crf(Some(23));
        if !backend.supports(VideoCodec::H264) {
            return;
        }
        let settings = EncoderSettings {
            codec: VideoCodec::H264,
            width: 320,
            height: 180,
            fps: 30,
            bitrate: 1_000_000,
        };
        let mut stream = backend.start(&settings).unwrap();
        let frame = RgbaImage::new(320, 180);
        let mut bytes = Vec::new();
        let mut chunks = 0;
        for _ in 0..120 {
            let chunk = stream.encode(&frame).unwrap();
            if !chunk.is_empty() {
                chunks += 1;
            }
            bytes.extend(chunk);
        }
        bytes.extend(stream.finish().unwrap());
        assert!(chunks > 0, "no bytes were streamed before finish");
        assert_eq!(&bytes[4..8], b"ftyp");
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
