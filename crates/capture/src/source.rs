use crate::error::CaptureError;
use crate::frame::Frame;
use crate::images::{ImageSequence, is_image_path};
use std::path::{Path, PathBuf};

/// Pull-based frame producer.
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted.
    fn read(&mut self) -> anyhow::Result<Option<Frame>>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> anyhow::Result<Option<Frame>> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Where frames come from, resolved from the `--input` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Camera(u32),
    ImageFile(PathBuf),
    ImageDirectory(PathBuf),
    ImagePattern(String),
    Video(PathBuf),
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::Camera(0)
    }
}

impl InputSource {
    /// No input means the default camera; `3` or `/dev/video3` mean camera 3.
    pub fn resolve(input: Option<&str>) -> Self {
        let Some(input) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return InputSource::default();
        };

        if let Some(index) = parse_device_index(input) {
            return InputSource::Camera(index);
        }

        let path = Path::new(input);
        if path.is_dir() {
            InputSource::ImageDirectory(path.to_path_buf())
        } else if input.contains(['*', '?', '[']) {
            InputSource::ImagePattern(input.to_string())
        } else if is_image_path(path) {
            InputSource::ImageFile(path.to_path_buf())
        } else {
            InputSource::Video(path.to_path_buf())
        }
    }
}

/// Parse a `/dev/videoX` style URI or a bare index.
pub(crate) fn parse_device_index(uri: &str) -> Option<u32> {
    if let Ok(index) = uri.parse::<u32>() {
        return Some(index);
    }
    uri.strip_prefix("/dev/video")
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .and_then(|rest| rest.parse().ok())
}

/// Open the frame source for an input.
pub fn open_source(input: &InputSource) -> Result<Box<dyn FrameSource>, CaptureError> {
    tracing::info!(input = ?input, "Opening frame source");

    match input {
        InputSource::Camera(index) => open_camera(*index),
        InputSource::ImageFile(path) => Ok(Box::new(ImageSequence::single(path)?)),
        InputSource::ImageDirectory(dir) => Ok(Box::new(ImageSequence::from_directory(dir)?)),
        InputSource::ImagePattern(pattern) => Ok(Box::new(ImageSequence::from_pattern(pattern)?)),
        InputSource::Video(path) => open_video(path),
    }
}

#[cfg(feature = "opencv")]
fn open_camera(index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
    Ok(Box::new(crate::video::VideoCaptureSource::open_camera(index)?))
}

#[cfg(all(feature = "v4l", not(feature = "opencv")))]
fn open_camera(index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
    Ok(Box::new(crate::device::V4lCamera::open(index)?))
}

#[cfg(not(any(feature = "opencv", feature = "v4l")))]
fn open_camera(_index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
    Err(CaptureError::CameraUnsupported)
}

#[cfg(feature = "opencv")]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>, CaptureError> {
    Ok(Box::new(crate::video::VideoCaptureSource::open_file(path)?))
}

#[cfg(not(feature = "opencv"))]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>, CaptureError> {
    if !path.exists() {
        return Err(CaptureError::Open {
            uri: path.display().to_string(),
        });
    }
    Err(CaptureError::VideoUnsupported(path.to_path_buf()))
}
