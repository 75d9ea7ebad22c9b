use crate::error::CaptureError;
use crate::frame::Frame;
use crate::source::FrameSource;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Formats the `image` dependency is built with.
const DECODABLE_FORMATS: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Bmp];

/// Whether the path has an extension of a still image format we can decode.
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|format| DECODABLE_FORMATS.contains(&format))
        .unwrap_or(false)
}

/// Ordered list of still images served one frame per file.
///
/// A single image behaves like a one-frame stream: the second read reports
/// the end of the stream.
#[derive(Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    pub fn single(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();
        if !path.is_file() {
            return Err(CaptureError::Open {
                uri: path.display().to_string(),
            });
        }
        Ok(Self::from_paths(vec![path]))
    }

    /// Every decodable image directly inside `dir`, sorted by file name.
    pub fn from_directory(dir: &Path) -> Result<Self, CaptureError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_image_path(&path) {
                paths.push(path);
            }
        }
        Self::non_empty(paths, dir.display().to_string())
    }

    /// Files matching a glob pattern such as `frames/img_*.png`, sorted.
    pub fn from_pattern(pattern: &str) -> Result<Self, CaptureError> {
        let paths = glob::glob(pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable glob match");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        Self::non_empty(paths, pattern.to_string())
    }

    fn non_empty(mut paths: Vec<PathBuf>, what: String) -> Result<Self, CaptureError> {
        if paths.is_empty() {
            return Err(CaptureError::NoImages(what));
        }
        paths.sort();
        tracing::info!(count = paths.len(), source = %what, "Image sequence ready");
        Ok(Self::from_paths(paths))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn read(&mut self) -> anyhow::Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };

        let image = image::open(path).map_err(|source| CaptureError::Decode {
            path: path.clone(),
            source,
        })?;

        let frame = Frame::from_rgb_image(self.next as u64, image.to_rgb8());
        tracing::debug!(
            path = %path.display(),
            width = frame.width,
            height = frame.height,
            "Loaded image"
        );

        self.next += 1;
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        match self.paths.as_slice() {
            [single] => single.display().to_string(),
            paths => format!("{} images", paths.len()),
        }
    }
}
