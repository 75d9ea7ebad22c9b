use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open input {uri}")]
    Open { uri: String },

    #[error("No images found for {0}")]
    NoImages(String),

    #[error("Camera capture requires the `opencv` or `v4l` feature")]
    CameraUnsupported,

    #[error("Video input {} requires the `opencv` feature", .0.display())]
    VideoUnsupported(PathBuf),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
