use crate::display::DisplaySurface;
use crate::labels::ClassLabels;
use crate::overlay::{
    OverlayLine, OverlayStyle, inference_time_line, prediction_line, throughput_line,
};
use anyhow::Context;
use capture::{Frame, FrameSource};
use common::span;
use inference::{ForwardPolicy, InferenceBackend, Prediction, TimingSample, top_class_of};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use preprocess::{BlobBuilder, BlobParams};
use std::time::Duration;

/// Key poll after each presented frame.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Per-frame processing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub blob: BlobParams,
    pub batch_size: usize,
    pub output_layer: Option<String>,
    pub policy: ForwardPolicy,
    pub overlay: OverlayStyle,
    pub poll_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            blob: BlobParams::default(),
            batch_size: 1,
            output_layer: None,
            policy: ForwardPolicy::default(),
            overlay: OverlayStyle::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source returned no frame or an empty one.
    SourceExhausted,
    QuitRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub stop: StopReason,
}

/// Outcome of one classified frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub prediction: Prediction,
    pub label: String,
    pub timing: TimingSample,
    /// Engine-reported duration of the last forward pass.
    pub engine_time: Duration,
    pub lines: Vec<OverlayLine>,
}

struct LoopMetrics {
    forward_duration: Histogram<f64>,
    frames: Counter<u64>,
}

fn init_metrics(meter_name: &'static str) -> LoopMetrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.0005, 0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0,
    ];
    LoopMetrics {
        forward_duration: meter
            .f64_histogram("classification_forward_duration_seconds")
            .with_description("Forward pass time per image over the timed passes")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
        frames: meter
            .u64_counter("classification_frames_total")
            .with_description("Total frames classified")
            .build(),
    }
}

pub struct ClassificationService<B: InferenceBackend> {
    backend: B,
    builder: BlobBuilder,
    labels: ClassLabels,
    settings: PipelineSettings,
    metrics: LoopMetrics,
}

impl<B: InferenceBackend> ClassificationService<B> {
    pub fn new(backend: B, labels: ClassLabels, settings: PipelineSettings) -> Self {
        Self {
            backend,
            builder: BlobBuilder::new(settings.blob.clone()),
            labels,
            settings,
            metrics: init_metrics("classification"),
        }
    }

    /// Classify frames until the source runs dry or the display asks to quit.
    pub fn run<S, D>(&mut self, source: &mut S, display: &mut D) -> anyhow::Result<LoopSummary>
    where
        S: FrameSource + ?Sized,
        D: DisplaySurface + ?Sized,
    {
        tracing::info!(
            source = %source.describe(),
            batch_size = self.settings.batch_size,
            warmup = self.settings.policy.warmup_passes,
            reps = self.settings.policy.timed_passes,
            "Classification loop starting"
        );

        let batch_attr = [KeyValue::new("batch_size", self.settings.batch_size as i64)];
        let mut frames = 0u64;

        loop {
            let frame = source
                .read()
                .with_context(|| format!("Failed to read from {}", source.describe()))?;
            let Some(frame) = frame.filter(|f| !f.is_empty()) else {
                tracing::info!(frames, "Frame source exhausted");
                display.wait_for_key()?;
                return Ok(LoopSummary {
                    frames,
                    stop: StopReason::SourceExhausted,
                });
            };

            let result = self
                .process_frame(&frame)
                .with_context(|| format!("Failed to classify frame {}", frame.index))?;

            self.metrics
                .forward_duration
                .record(result.timing.per_image().as_secs_f64(), &batch_attr);
            self.metrics.frames.add(1, &batch_attr);
            frames += 1;

            display.show(&frame, &result.lines, &self.settings.overlay)?;

            if display.poll_quit(self.settings.poll_interval)? {
                tracing::info!(frames, "Quit requested");
                return Ok(LoopSummary {
                    frames,
                    stop: StopReason::QuitRequested,
                });
            }
        }
    }

    /// Blob, warm-up and timed forward passes, arg-max and overlay text for
    /// one non-empty frame.
    pub fn process_frame(&mut self, frame: &Frame) -> anyhow::Result<FrameResult> {
        let _s = span!("process_frame");

        let blob = self.builder.blob_from_batch(
            &frame.pixels,
            frame.width,
            frame.height,
            self.settings.batch_size,
        )?;

        let outcome = self.settings.policy.run(
            &mut self.backend,
            &blob,
            self.settings.output_layer.as_deref(),
        )?;

        let prediction = top_class_of(&outcome.scores)
            .context("Engine returned no usable class scores")?;
        let timing = outcome.timing;
        let engine_time = self
            .backend
            .perf_profile()
            .unwrap_or_else(|| timing.elapsed / timing.passes);
        let label = self.labels.label_for(prediction.class_id).into_owned();

        tracing::debug!(
            frame = frame.index,
            class_id = prediction.class_id,
            confidence = prediction.confidence,
            label = %label,
            per_image_ms = timing.per_image_ms(),
            "Frame classified"
        );

        let lines = self.settings.overlay.layout([
            inference_time_line(engine_time.as_secs_f64() * 1000.0),
            throughput_line(timing.batch_size, timing.per_image_ms()),
            prediction_line(&label, prediction.confidence),
        ]);

        Ok(FrameResult {
            prediction,
            label,
            timing,
            engine_time,
            lines,
        })
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}
