use crate::params::BlobParams;
use common::{span, span_debug};
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, ArrayViewD, Axis, IxDyn};

/// Batched NCHW input tensor: `[batch, 3, height, width]`.
#[derive(Debug, Clone)]
pub struct Blob {
    data: Array<f32, IxDyn>,
}

impl Blob {
    pub fn batch_size(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[3]
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// One `[3, height, width]` image of the batch.
    pub fn item(&self, index: usize) -> ArrayViewD<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn as_array(&self) -> &Array<f32, IxDyn> {
        &self.data
    }

    pub fn into_array(self) -> Array<f32, IxDyn> {
        self.data
    }
}

/// Builds blobs from RGB8 HWC frames.
///
/// Keeps its resize buffer between calls so a capture loop does not
/// reallocate per frame.
pub struct BlobBuilder {
    params: BlobParams,
    resizer: Resizer,
    resized_buffer: Vec<u8>,
}

impl BlobBuilder {
    pub fn new(params: BlobParams) -> Self {
        Self {
            params,
            resizer: Resizer::new(),
            resized_buffer: Vec::new(),
        }
    }

    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    pub fn blob_from_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<Blob> {
        self.blob_from_batch(pixels, width, height, 1)
    }

    /// Build a blob holding `batch_size` identical copies of one image.
    pub fn blob_from_batch(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        batch_size: usize,
    ) -> anyhow::Result<Blob> {
        let _s = span!("blob_from_batch");

        if batch_size == 0 {
            anyhow::bail!("Batch size must be at least 1");
        }
        if width == 0 || height == 0 {
            anyhow::bail!("Cannot build a blob from an empty {width}x{height} image");
        }

        let expected_size = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {} bytes for {}x{} RGB, got {} bytes",
                expected_size,
                width,
                height,
                pixels.len()
            );
        }

        let (target_width, target_height) = self.params.target_size(width, height);
        if target_width == 0 || target_height == 0 {
            anyhow::bail!("Invalid blob size {target_width}x{target_height}");
        }

        tracing::trace!(
            width,
            height,
            target_width,
            target_height,
            batch_size,
            "Building blob"
        );

        let image = if (target_width, target_height) == (width, height) {
            self.normalize(pixels)
        } else {
            self.resize(pixels, width, height, target_width, target_height)?;
            self.normalize(&self.resized_buffer)
        };

        let mut data = Vec::with_capacity(image.len() * batch_size);
        for _ in 0..batch_size {
            data.extend_from_slice(&image);
        }

        let data = Array::from_shape_vec(
            IxDyn(&[
                batch_size,
                3,
                target_height as usize,
                target_width as usize,
            ]),
            data,
        )?;

        Ok(Blob { data })
    }

    fn resize(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    ) -> anyhow::Result<()> {
        let _s = span_debug!("resize");

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;

        self.resized_buffer
            .resize((target_width as usize) * (target_height as usize) * 3, 0);
        let mut dst = Image::from_slice_u8(
            target_width,
            target_height,
            &mut self.resized_buffer,
            PixelType::U8x3,
        )?;

        self.resizer.resize(
            &src,
            &mut dst,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(())
    }

    /// HWC u8 → CHW f32 with mean subtraction, scaling and channel reordering.
    fn normalize(&self, pixels: &[u8]) -> Vec<f32> {
        let _s = span_debug!("normalize");

        let spatial = pixels.len() / 3;
        let source = self.params.channel_order.source_indices();
        let mean = self.params.mean;
        let scale = self.params.scale;

        let mut output = vec![0.0f32; 3 * spatial];
        for (i, px) in pixels.chunks_exact(3).enumerate() {
            for c in 0..3 {
                output[c * spatial + i] = (px[source[c]] as f32 - mean[c]) * scale;
            }
        }
        output
    }
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new(BlobParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ChannelOrder;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        rgb.iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect()
    }

    #[test]
    fn test_blob_shape_follows_target_size() {
        let mut builder = BlobBuilder::new(BlobParams {
            size: Some((224, 160)),
            ..Default::default()
        });
        let pixels = solid(64, 48, [10, 20, 30]);

        let blob = builder.blob_from_image(&pixels, 64, 48).unwrap();

        assert_eq!(blob.shape(), &[1, 3, 160, 224]);
        assert_eq!(blob.width(), 224);
        assert_eq!(blob.height(), 160);
    }

    #[test]
    fn test_blob_without_size_keeps_resolution() {
        let mut builder = BlobBuilder::default();
        let pixels = solid(5, 3, [1, 2, 3]);

        let blob = builder.blob_from_image(&pixels, 5, 3).unwrap();

        assert_eq!(blob.shape(), &[1, 3, 3, 5]);
    }

    #[test]
    fn test_batch_contains_identical_copies() {
        let mut builder = BlobBuilder::new(BlobParams {
            scale: 1.0 / 255.0,
            mean: [104.0, 117.0, 123.0],
            channel_order: ChannelOrder::Bgr,
            size: Some((32, 32)),
        });
        let mut pixels = Vec::with_capacity(40 * 30 * 3);
        for y in 0..30u32 {
            for x in 0..40u32 {
                pixels.extend_from_slice(&[(x * 6) as u8, (y * 8) as u8, ((x + y) * 3) as u8]);
            }
        }

        let blob = builder.blob_from_batch(&pixels, 40, 30, 4).unwrap();

        assert_eq!(blob.shape(), &[4, 3, 32, 32]);
        let first = blob.item(0);
        for n in 1..4 {
            assert_eq!(blob.item(n), first, "Batch item {} should equal item 0", n);
        }
    }

    #[test]
    fn test_mean_and_scale_in_bgr_order() {
        let mut builder = BlobBuilder::new(BlobParams {
            scale: 0.5,
            mean: [1.0, 2.0, 3.0],
            channel_order: ChannelOrder::Bgr,
            size: None,
        });
        let pixels = solid(2, 2, [10, 20, 30]);

        let blob = builder.blob_from_image(&pixels, 2, 2).unwrap();
        let data = blob.as_array();

        // Channel 0 is blue: (30 - 1) * 0.5
        assert_eq!(data[[0, 0, 0, 0]], 14.5);
        assert_eq!(data[[0, 1, 0, 0]], 9.0);
        // Channel 2 is red: (10 - 3) * 0.5
        assert_eq!(data[[0, 2, 1, 1]], 3.5);
    }

    #[test]
    fn test_channel_swap_produces_rgb_order() {
        let mut builder = BlobBuilder::new(BlobParams {
            scale: 0.5,
            mean: [1.0, 2.0, 3.0],
            channel_order: ChannelOrder::from_swap_rb(true),
            size: None,
        });
        let pixels = solid(2, 2, [10, 20, 30]);

        let blob = builder.blob_from_image(&pixels, 2, 2).unwrap();
        let data = blob.as_array();

        assert_eq!(data[[0, 0, 0, 0]], 4.5);
        assert_eq!(data[[0, 1, 0, 0]], 9.0);
        assert_eq!(data[[0, 2, 0, 0]], 13.5);
    }

    #[test]
    fn test_resize_of_uniform_image_stays_uniform() {
        let mut builder = BlobBuilder::new(BlobParams {
            size: Some((17, 9)),
            channel_order: ChannelOrder::Rgb,
            ..Default::default()
        });
        let pixels = solid(50, 40, [200, 100, 50]);

        let blob = builder.blob_from_image(&pixels, 50, 40).unwrap();
        let data = blob.as_array();

        for y in 0..9 {
            for x in 0..17 {
                assert!((data[[0, 0, y, x]] - 200.0).abs() <= 1.0);
                assert!((data[[0, 1, y, x]] - 100.0).abs() <= 1.0);
                assert!((data[[0, 2, y, x]] - 50.0).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_buffer_size_mismatch_detection() {
        let mut builder = BlobBuilder::default();
        let pixels = vec![0u8; 200]; // Wrong size for 10x10

        let result = builder.blob_from_image(&pixels, 10, 10);

        assert!(result.is_err(), "Size mismatch should return error");
        assert!(
            result.unwrap_err().to_string().contains("mismatch"),
            "Error should mention mismatch"
        );
    }

    #[test]
    fn test_zero_batch_and_empty_image_are_rejected() {
        let mut builder = BlobBuilder::default();
        let pixels = solid(2, 2, [0, 0, 0]);

        assert!(builder.blob_from_batch(&pixels, 2, 2, 0).is_err());
        assert!(builder.blob_from_image(&[], 0, 0).is_err());
    }
}
