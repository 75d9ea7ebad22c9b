use super::{InferenceBackend, ModelSource};
use crate::selectors::ExecutionPreference;
use ndarray::{Array, ArrayD, IxDyn};
use preprocess::Blob;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted backend returning fixed class scores for every image of a batch.
#[derive(Debug, Clone)]
pub struct MockBackend {
    scores: Vec<f32>,
    profile: Duration,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn with_scores(scores: Vec<f32>) -> Self {
        Self {
            scores,
            profile: Duration::from_millis(3),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every forward pass fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_scores(Vec::new())
        }
    }

    pub fn with_profile(mut self, profile: Duration) -> Self {
        self.profile = profile;
        self
    }

    /// Shared forward-pass counter, still readable after the backend has
    /// been moved into a service.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceBackend for MockBackend {
    fn load_model(source: &ModelSource, _preference: ExecutionPreference) -> anyhow::Result<Self> {
        tracing::info!(model = %source.model.display(), "Creating mock inference backend");
        Ok(Self::with_scores(vec![1.0]))
    }

    fn forward(&mut self, blob: &Blob, _output: Option<&str>) -> anyhow::Result<ArrayD<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("mock forward failure");
        }

        let batch = blob.batch_size();
        let data = self
            .scores
            .iter()
            .copied()
            .cycle()
            .take(self.scores.len() * batch)
            .collect();
        Ok(Array::from_shape_vec(
            IxDyn(&[batch, self.scores.len()]),
            data,
        )?)
    }

    fn perf_profile(&self) -> Option<Duration> {
        (self.calls() > 0).then_some(self.profile)
    }
}
