//! Two-frame GIF encoding

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use log::debug;

use crate::rendering::{to_rgba_image, DiffFrames, Pixmap};
use crate::{Error, Result};

/// GIF encoder settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GifOptions {
    /// Time each frame stays on screen
    pub frame_delay_ms: u32,
    /// Loop forever instead of playing once
    pub repeat_forever: bool,
    /// Color quantization sample factor, 1 (best) to 30 (fastest)
    pub quality: i32,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            frame_delay_ms: 500,
            repeat_forever: true,
            quality: 20,
        }
    }
}

/// Encode frames, in order, into an in-memory GIF
pub fn encode_gif(frames: &[&Pixmap], options: &GifOptions) -> Result<Vec<u8>> {
    let first = frames
        .first()
        .ok_or_else(|| Error::EncodeError("no frames to encode".into()))?;
    if frames.iter().any(|f| f.width() != first.width() || f.height() != first.height()) {
        return Err(Error::EncodeError("frames differ in size".into()));
    }

    let speed = options.quality.clamp(1, 30);
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, speed);
        encoder.set_repeat(if options.repeat_forever {
            Repeat::Infinite
        } else {
            Repeat::Finite(0)
        })?;
        for pixmap in frames {
            let buffer = to_rgba_image(pixmap)?;
            let delay = Delay::from_numer_denom_ms(options.frame_delay_ms, 1);
            encoder.encode_frame(Frame::from_parts(buffer, 0, 0, delay))?;
        }
    }
    debug!(
        "encoded {} frames of {}x{} into {} bytes",
        frames.len(),
        first.width(),
        first.height(),
        out.len()
    );
    Ok(out)
}

/// Encode a diff as after-frame then before-frame
pub fn encode_diff(frames: &DiffFrames, options: &GifOptions) -> Result<Vec<u8>> {
    encode_gif(&frames.in_order(), options)
}
