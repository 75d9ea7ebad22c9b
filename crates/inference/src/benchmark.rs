//! Forward-pass policy: a discarded warm-up phase followed by a timed phase
//! whose last result is kept.

use crate::backend::InferenceBackend;
use common::span;
use ndarray::ArrayD;
use preprocess::Blob;
use std::time::{Duration, Instant};

pub const DEFAULT_WARMUP_PASSES: u32 = 1;
pub const DEFAULT_TIMED_PASSES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardPolicy {
    pub warmup_passes: u32,
    /// Always at least one: the last timed pass produces the result.
    pub timed_passes: u32,
}

impl ForwardPolicy {
    pub fn new(warmup_passes: u32, timed_passes: u32) -> Self {
        Self {
            warmup_passes,
            timed_passes: timed_passes.max(1),
        }
    }

    pub fn run<B: InferenceBackend + ?Sized>(
        &self,
        backend: &mut B,
        blob: &Blob,
        output: Option<&str>,
    ) -> anyhow::Result<ForwardOutcome> {
        warm_up(backend, blob, output, self.warmup_passes)?;
        measure(backend, blob, output, self.timed_passes)
    }
}

impl Default for ForwardPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WARMUP_PASSES, DEFAULT_TIMED_PASSES)
    }
}

/// Wall-clock time of `passes` forward passes over a blob of `batch_size` images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub elapsed: Duration,
    pub passes: u32,
    pub batch_size: usize,
}

impl TimingSample {
    pub fn images(&self) -> u64 {
        u64::from(self.passes) * self.batch_size as u64
    }

    /// `elapsed / (batch_size * passes)`; zero when nothing ran.
    pub fn per_image(&self) -> Duration {
        match self.images() {
            0 => Duration::ZERO,
            images => Duration::from_secs_f64(self.elapsed.as_secs_f64() / images as f64),
        }
    }

    pub fn per_image_ms(&self) -> f64 {
        self.per_image().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    pub scores: ArrayD<f32>,
    pub timing: TimingSample,
}

/// Run forward passes whose results are thrown away.
pub fn warm_up<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    blob: &Blob,
    output: Option<&str>,
    passes: u32,
) -> anyhow::Result<()> {
    let _s = span!("warm_up");

    for _ in 0..passes {
        backend.forward(blob, output)?;
    }
    tracing::trace!(passes, "Warm-up done");
    Ok(())
}

/// Run `passes` timed forward passes (at least one) and keep the last result.
pub fn measure<B: InferenceBackend + ?Sized>(
    backend: &mut B,
    blob: &Blob,
    output: Option<&str>,
    passes: u32,
) -> anyhow::Result<ForwardOutcome> {
    let _s = span!("measure");

    let passes = passes.max(1);
    let start = Instant::now();
    let mut scores = backend.forward(blob, output)?;
    for _ in 1..passes {
        scores = backend.forward(blob, output)?;
    }
    let elapsed = start.elapsed();

    Ok(ForwardOutcome {
        scores,
        timing: TimingSample {
            elapsed,
            passes,
            batch_size: blob.batch_size(),
        },
    })
}
