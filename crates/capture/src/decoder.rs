use anyhow::{Context, Result};
use common::span;

/// Trait for decoding raw camera frames to RGB.
pub trait FrameDecoder: Send {
    /// Decode raw frame data to RGB (3 bytes per pixel).
    /// Returns the decoded dimensions and a reference to the decoder's internal buffer.
    fn decode(&mut self, raw: &[u8], width: u32, height: u32) -> Result<(u32, u32, &[u8])>;
}

/// YUYV (YUV 4:2:2) decoder.
///
/// YUYV packs 2 pixels in 4 bytes: [Y0, U, Y1, V]
#[derive(Default)]
pub struct YuyvDecoder {
    rgb_buffer: Vec<u8>,
}

impl YuyvDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for YuyvDecoder {
    fn decode(&mut self, raw: &[u8], width: u32, height: u32) -> Result<(u32, u32, &[u8])> {
        let _s = span!("decode_yuyv");

        if width % 2 != 0 || height == 0 {
            anyhow::bail!("YUYV frame must have an even, non-zero width (got {width}x{height})");
        }

        let bytes_per_row = (width * 2) as usize;
        if raw.len() < bytes_per_row * height as usize {
            anyhow::bail!(
                "YUYV buffer too small: expected at least {} bytes, got {}",
                bytes_per_row * height as usize,
                raw.len()
            );
        }

        let rgb_size = (width * height * 3) as usize;
        self.rgb_buffer.resize(rgb_size, 0);

        // Drivers may pad rows.
        let stride = raw.len() / height as usize;

        let mut out_idx = 0;
        for row in 0..height as usize {
            let row_start = row * stride;
            let row_data = &raw[row_start..row_start + bytes_per_row];

            for chunk in row_data.chunks_exact(4) {
                let y0 = chunk[0] as i32;
                let u = chunk[1] as i32 - 128;
                let y1 = chunk[2] as i32;
                let v = chunk[3] as i32 - 128;

                // BT.601 fixed-point coefficients (8-bit fraction)
                let rv = (359 * v) >> 8;
                let gu = (88 * u + 183 * v) >> 8;
                let bu = (454 * u) >> 8;

                for y in [y0, y1] {
                    self.rgb_buffer[out_idx] = (y + rv).clamp(0, 255) as u8;
                    self.rgb_buffer[out_idx + 1] = (y - gu).clamp(0, 255) as u8;
                    self.rgb_buffer[out_idx + 2] = (y + bu).clamp(0, 255) as u8;
                    out_idx += 3;
                }
            }
        }

        Ok((width, height, &self.rgb_buffer[..rgb_size]))
    }
}

/// MJPEG decoder backed by the `image` crate's JPEG codec.
#[derive(Default)]
pub struct MjpegDecoder {
    rgb_buffer: Vec<u8>,
}

impl MjpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for MjpegDecoder {
    fn decode(&mut self, raw: &[u8], _width: u32, _height: u32) -> Result<(u32, u32, &[u8])> {
        let _s = span!("decode_mjpeg");

        let image = image::load_from_memory_with_format(raw, image::ImageFormat::Jpeg)
            .context("Failed to decode MJPEG frame")?
            .to_rgb8();
        let (width, height) = image.dimensions();

        self.rgb_buffer.clear();
        self.rgb_buffer.extend_from_slice(image.as_raw());

        Ok((width, height, &self.rgb_buffer))
    }
}
