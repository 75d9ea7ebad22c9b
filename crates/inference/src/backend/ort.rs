use super::{InferenceBackend, ModelSource};
use crate::framework::Framework;
use crate::selectors::{ComputeBackend, ComputeTarget, ExecutionPreference};
use anyhow::Context;
use ndarray::ArrayD;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use preprocess::Blob;
use std::time::{Duration, Instant};

const INTRA_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    /// Map a backend/target request onto what ONNX Runtime can run here.
    pub fn resolve(preference: ExecutionPreference) -> Self {
        let ExecutionPreference { backend, target } = preference;

        if target.is_cuda() || backend == ComputeBackend::Cuda {
            if backend != ComputeBackend::Cuda && backend != ComputeBackend::Default {
                tracing::warn!(%backend, %target, "Backend ignored, running on CUDA");
            }
            return ExecutionProvider::Cuda;
        }

        if backend != ComputeBackend::Default {
            tracing::warn!(%backend, "Backend not available with ONNX Runtime, using its default");
        }
        if target != ComputeTarget::Cpu {
            tracing::warn!(%target, "Target not available with ONNX Runtime, falling back to CPU");
        }
        ExecutionProvider::Cpu
    }
}

pub struct OrtBackend {
    session: Session,
    last_forward: Option<Duration>,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &std::path::Path,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(INTRA_THREADS)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model {}", path.display()))?;

        tracing::info!("Model loaded from {}", path.display());
        Ok(Self {
            session,
            last_forward: None,
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(source: &ModelSource, preference: ExecutionPreference) -> anyhow::Result<Self> {
        if source.framework != Framework::Onnx {
            anyhow::bail!(
                "ONNX Runtime cannot load {} models ({}); export the network to ONNX",
                source.framework,
                source.model.display()
            );
        }
        if let Some(config) = &source.config {
            tracing::warn!(config = %config.display(), "ONNX models carry their own graph, ignoring config file");
        }

        Self::load_model_with_provider(&source.model, ExecutionProvider::resolve(preference))
    }

    fn forward(&mut self, blob: &Blob, output: Option<&str>) -> anyhow::Result<ArrayD<f32>> {
        let start = Instant::now();

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(blob.view())?])?;

        let value = match output {
            Some(name) => outputs
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("Model has no output named '{name}'"))?,
            None => &outputs[0],
        };
        let scores = value.try_extract_array::<f32>()?.into_owned();

        self.last_forward = Some(start.elapsed());
        Ok(scores)
    }

    fn perf_profile(&self) -> Option<Duration> {
        self.last_forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuda_target_selects_cuda_provider() {
        let preference = ExecutionPreference {
            backend: ComputeBackend::Default,
            target: ComputeTarget::Cuda,
        };
        assert_eq!(ExecutionProvider::resolve(preference), ExecutionProvider::Cuda);

        let preference = ExecutionPreference {
            backend: ComputeBackend::Cuda,
            target: ComputeTarget::Cpu,
        };
        assert_eq!(ExecutionProvider::resolve(preference), ExecutionProvider::Cuda);
    }

    #[test]
    fn test_unsupported_selections_fall_back_to_cpu() {
        for target in [ComputeTarget::Cpu, ComputeTarget::OpenCl, ComputeTarget::Vpu] {
            let preference = ExecutionPreference {
                backend: ComputeBackend::OpenCv,
                target,
            };
            assert_eq!(ExecutionProvider::resolve(preference), ExecutionProvider::Cpu);
        }
    }

    #[test]
    fn test_non_onnx_models_are_rejected() {
        let source = ModelSource {
            model: "googlenet.caffemodel".into(),
            config: Some("googlenet.prototxt".into()),
            framework: Framework::Caffe,
        };
        let err = OrtBackend::load_model(&source, ExecutionPreference::default())
            .err()
            .expect("Caffe model should be rejected");
        assert!(err.to_string().contains("caffe"), "got: {err}");
    }
}
