use crate::error::CaptureError;
use crate::frame::Frame;
use crate::source::FrameSource;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

/// Video file or camera read through OpenCV `videoio`.
pub struct VideoCaptureSource {
    capture: VideoCapture,
    mat: Mat,
    uri: String,
    frames_read: u64,
}

impl VideoCaptureSource {
    pub fn open_camera(index: u32) -> Result<Self, CaptureError> {
        let uri = format!("camera #{index}");
        let capture = VideoCapture::new(index as i32, videoio::CAP_ANY)
            .map_err(|e| open_error(&uri, e))?;
        Self::from_capture(capture, uri)
    }

    pub fn open_file(path: &Path) -> Result<Self, CaptureError> {
        let uri = path.display().to_string();
        let capture =
            VideoCapture::from_file(&uri, videoio::CAP_ANY).map_err(|e| open_error(&uri, e))?;
        Self::from_capture(capture, uri)
    }

    fn from_capture(capture: VideoCapture, uri: String) -> Result<Self, CaptureError> {
        if !capture.is_opened().map_err(|e| open_error(&uri, e))? {
            return Err(CaptureError::Open { uri });
        }
        tracing::info!(uri, "Video capture opened");
        Ok(Self {
            capture,
            mat: Mat::default(),
            uri,
            frames_read: 0,
        })
    }
}

fn open_error(uri: &str, err: opencv::Error) -> CaptureError {
    tracing::error!(error = %err, uri, "OpenCV failed to open input");
    CaptureError::Open {
        uri: uri.to_string(),
    }
}

impl FrameSource for VideoCaptureSource {
    fn read(&mut self) -> anyhow::Result<Option<Frame>> {
        if !self.capture.read(&mut self.mat)? || self.mat.empty() {
            return Ok(None);
        }

        if self.mat.channels() != 3 {
            anyhow::bail!("Expected a 3-channel BGR frame, got {} channels", self.mat.channels());
        }

        let width = self.mat.cols() as u32;
        let height = self.mat.rows() as u32;

        let continuous;
        let mat = if self.mat.is_continuous() {
            &self.mat
        } else {
            continuous = self.mat.try_clone()?;
            &continuous
        };

        let rgb = mat
            .data_bytes()?
            .chunks_exact(3)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect();

        let frame = Frame::new(self.frames_read, width, height, rgb)?;
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        self.uri.clone()
    }
}
