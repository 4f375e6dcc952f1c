//! Animated GIF backend built on the `image` crate. Always available.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use log::debug;

use super::encoder::{check_frame_size, EncoderBackend, EncoderError, EncoderSettings, StreamEncoder, VideoCodec};

/// Alpha values below this become fully transparent, the rest opaque.
const ALPHA_THRESHOLD: u8 = 128;

/// Bitrate that buys the slowest, most accurate quantizer.
const BEST_QUALITY_BITRATE: u32 = 80_000_000;

/// Appends everything written to a buffer the encoder does not own.
struct ChunkWriter(Rc<RefCell<Vec<u8>>>);

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// GIF has no bitrate control. The requested bitrate picks the palette
/// quantizer speed instead: 8 Mbps maps to speed 10, and higher bitrates
/// trade encode time for more accurate colors.
#[derive(Debug, Clone, Default)]
pub struct GifBackend {
    /// Fixed quantizer speed, 1 (best) to 30 (fastest).
    speed: Option<i32>,
}

impl GifBackend {
    pub fn new() -> Self {
        Self { speed: None }
    }

    pub fn with_speed(speed: i32) -> Self {
        Self {
            speed: Some(speed.clamp(1, 30)),
        }
    }

    /// Quantizer speed used for a stream at `bitrate`.
    pub fn speed_for(&self, bitrate: u32) -> i32 {
        self.speed
            .unwrap_or_else(|| (BEST_QUALITY_BITRATE / bitrate.max(1)).clamp(1, 30) as i32)
    }
}

impl EncoderBackend for GifBackend {
    fn name(&self) -> &str {
        "gif"
    }

    fn supports(&self, codec: VideoCodec) -> bool {
        codec == VideoCodec::Gif
    }

    fn start(&self, settings: &EncoderSettings) -> Result<Box<dyn StreamEncoder>, EncoderError> {
        if !self.supports(settings.codec) {
            return Err(EncoderError::Unsupported(settings.codec));
        }
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let speed = self.speed_for(settings.bitrate);
        debug!("gif stream at {} bps uses quantizer speed {}", settings.bitrate, speed);
        let mut encoder = GifEncoder::new_with_speed(ChunkWriter(Rc::clone(&buffer)), speed);
        encoder.set_repeat(Repeat::Infinite)?;

        Ok(Box::new(GifStream {
            encoder: Some(encoder),
            buffer,
            delay: Delay::from_numer_denom_ms(1000, settings.fps.max(1)),
            settings: settings.clone(),
        }))
    }
}

struct GifStream {
    encoder: Option<GifEncoder<ChunkWriter>>,
    buffer: Rc<RefCell<Vec<u8>>>,
    delay: Delay,
    settings: EncoderSettings,
}

impl GifStream {
    fn drain(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.borrow_mut())
    }
}

impl StreamEncoder for GifStream {
    fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    fn encode(&mut self, frame: &RgbaImage) -> Result<Vec<u8>, EncoderError> {
        check_frame_size(&self.settings, frame)?;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| EncoderError::Encode("stream already finished".into()))?;

        let mut pixels = frame.clone();
        for pixel in pixels.pixels_mut() {
            pixel.0[3] = if pixel.0[3] < ALPHA_THRESHOLD { 0 } else { 255 };
        }
        encoder.encode_frame(Frame::from_parts(pixels, 0, 0, self.delay))?;
        Ok(self.drain())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, EncoderError> {
        // Dropping the encoder writes the trailer
        drop(self.encoder.take());
        Ok(self.drain())
    }
}
