use crate::framework::Framework;
use crate::selectors::ExecutionPreference;
use ndarray::ArrayD;
use preprocess::Blob;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "ort-backend")]
pub mod ort;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Model files and the framework they were exported from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSource {
    pub model: PathBuf,
    pub config: Option<PathBuf>,
    pub framework: Framework,
}

pub trait InferenceBackend {
    fn load_model(source: &ModelSource, preference: ExecutionPreference) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run one forward pass and return the named output, or the first
    /// output of the model when `output` is `None`.
    fn forward(&mut self, blob: &Blob, output: Option<&str>) -> anyhow::Result<ArrayD<f32>>;

    /// Engine-reported duration of the most recent forward pass.
    fn perf_profile(&self) -> Option<Duration>;
}
