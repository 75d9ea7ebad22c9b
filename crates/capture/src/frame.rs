use crate::error::CaptureError;
use image::RgbImage;

/// One captured RGB8 image in HWC layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Position in the stream, starting at 0.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected {
            return Err(CaptureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            index,
            width,
            height,
            pixels,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rgb_image(index: u64, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            index,
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// A source hands out an empty frame once it has nothing left.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
