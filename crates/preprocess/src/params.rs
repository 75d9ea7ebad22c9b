/// Channel order of the produced tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Blue, green, red. What most Caffe-era classification models expect.
    #[default]
    Bgr,
    Rgb,
}

impl ChannelOrder {
    pub fn from_swap_rb(swap_rb: bool) -> Self {
        if swap_rb { ChannelOrder::Rgb } else { ChannelOrder::Bgr }
    }

    /// Index into an RGB pixel for each output channel.
    pub(crate) fn source_indices(self) -> [usize; 3] {
        match self {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        }
    }
}

/// Preprocessing parameters applied to every image of a blob.
///
/// Each output channel `c` is computed as `(pixel[c] - mean[c]) * scale`,
/// where `mean` is given in output channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobParams {
    pub scale: f32,
    pub mean: [f32; 3],
    pub channel_order: ChannelOrder,
    /// Target (width, height). `None` keeps the source resolution.
    pub size: Option<(u32, u32)>,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            mean: [0.0; 3],
            channel_order: ChannelOrder::Bgr,
            size: None,
        }
    }
}

impl BlobParams {
    /// Spatial size of the blob for a source image of the given dimensions.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        self.size.unwrap_or((width, height))
    }
}
