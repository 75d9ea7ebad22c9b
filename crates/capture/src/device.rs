use crate::decoder::{FrameDecoder, MjpegDecoder, YuyvDecoder};
use crate::error::CaptureError;
use crate::frame::Frame;
use crate::source::FrameSource;
use anyhow::{Context, Result, anyhow};
use common::retry::retry_with_backoff;
use v4l::{
    Device, FourCC,
    buffer::Type,
    io::{mmap::Stream, traits::CaptureStream},
    video::Capture,
};

const BUFFER_COUNT: u32 = 4;
const OPEN_ATTEMPTS: u32 = 5;
const OPEN_BASE_DELAY_MS: u64 = 200;

const FOURCC_YUYV: FourCC = FourCC { repr: *b"YUYV" };
const FOURCC_MJPG: FourCC = FourCC { repr: *b"MJPG" };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Yuyv,
    Mjpeg,
}

fn open_device(index: u32) -> Result<Device> {
    let device = Device::new(index as usize)
        .with_context(|| format!("Failed to open /dev/video{index}"))?;
    device
        .query_caps()
        .with_context(|| format!("/dev/video{index} did not answer a capability query"))?;
    Ok(device)
}

/// Select best pixel format: prefer YUYV (cheap to decode), fallback to MJPEG
fn select_format(device: &Device) -> Result<PixelFormat> {
    let formats = device.enum_formats()?;

    tracing::debug!("Available formats:");
    for fmt in &formats {
        tracing::debug!("  {:?}: {}", fmt.fourcc, fmt.description);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_YUYV) {
        return Ok(PixelFormat::Yuyv);
    }

    if formats.iter().any(|f| f.fourcc == FOURCC_MJPG) {
        return Ok(PixelFormat::Mjpeg);
    }

    Err(anyhow!(
        "Camera supports neither YUYV nor MJPEG - available: {:?}",
        formats.iter().map(|f| f.fourcc).collect::<Vec<_>>()
    ))
}

/// V4L2 camera read through memory-mapped buffers.
pub struct V4lCamera {
    index: u32,
    stream: Stream<'static>,
    decoder: Box<dyn FrameDecoder>,
    width: u32,
    height: u32,
    frames_read: u64,
    // Keeps the device open for as long as the stream lives.
    _device: Device,
}

impl V4lCamera {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        Self::try_open(index).map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), index, "Camera open failed");
            CaptureError::Open {
                uri: format!("/dev/video{index}"),
            }
        })
    }

    fn try_open(index: u32) -> Result<Self> {
        let device = retry_with_backoff(
            || open_device(index),
            OPEN_ATTEMPTS,
            OPEN_BASE_DELAY_MS,
            "Camera open",
        )?;

        let caps = device.query_caps()?;
        tracing::info!("Camera opened: {} ({})", caps.card, caps.driver);

        let pixel_format = select_format(&device)?;
        let mut format = device.format()?;
        format.fourcc = match pixel_format {
            PixelFormat::Yuyv => FOURCC_YUYV,
            PixelFormat::Mjpeg => FOURCC_MJPG,
        };
        let format = device.set_format(&format)?;

        tracing::info!(
            "Capture format: {}x{} {:?} ({:?})",
            format.width,
            format.height,
            format.fourcc,
            pixel_format
        );

        let decoder: Box<dyn FrameDecoder> = match pixel_format {
            PixelFormat::Yuyv => Box::new(YuyvDecoder::new()),
            PixelFormat::Mjpeg => Box::new(MjpegDecoder::new()),
        };

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
            .context("Failed to create capture stream")?;

        Ok(Self {
            index,
            stream,
            decoder,
            width: format.width,
            height: format.height,
            frames_read: 0,
            _device: device,
        })
    }
}

impl FrameSource for V4lCamera {
    fn read(&mut self) -> Result<Option<Frame>> {
        let (raw, meta) = self.stream.next()?;
        if meta.bytesused == 0 {
            return Ok(None);
        }
        let raw = &raw[..(meta.bytesused as usize).min(raw.len())];

        let (width, height, rgb) = self.decoder.decode(raw, self.width, self.height)?;
        let frame = Frame::new(self.frames_read, width, height, rgb.to_vec())?;
        self.frames_read += 1;

        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        format!("/dev/video{} ({}x{})", self.index, self.width, self.height)
    }
}
