//! Compute backend and target selectors, numbered the way OpenCV's DNN
//! module numbers them so existing command lines keep working.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unknown compute backend '{0}' (expected 0-3, 5 or a backend name)")]
    UnknownBackend(String),
    #[error("unknown compute target '{0}' (expected 0-3, 6, 7 or a target name)")]
    UnknownTarget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeBackend {
    #[default]
    Default,
    Halide,
    InferenceEngine,
    OpenCv,
    Cuda,
}

impl ComputeBackend {
    pub fn id(self) -> u32 {
        match self {
            ComputeBackend::Default => 0,
            ComputeBackend::Halide => 1,
            ComputeBackend::InferenceEngine => 2,
            ComputeBackend::OpenCv => 3,
            ComputeBackend::Cuda => 5,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(ComputeBackend::Default),
            1 => Some(ComputeBackend::Halide),
            2 => Some(ComputeBackend::InferenceEngine),
            3 => Some(ComputeBackend::OpenCv),
            5 => Some(ComputeBackend::Cuda),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComputeBackend::Default => "default",
            ComputeBackend::Halide => "halide",
            ComputeBackend::InferenceEngine => "inference-engine",
            ComputeBackend::OpenCv => "opencv",
            ComputeBackend::Cuda => "cuda",
        }
    }
}

impl FromStr for ComputeBackend {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Ok(id) = key.parse::<u32>() {
            return Self::from_id(id).ok_or_else(|| SelectorError::UnknownBackend(s.to_string()));
        }
        match key.as_str() {
            "default" | "auto" => Ok(ComputeBackend::Default),
            "halide" => Ok(ComputeBackend::Halide),
            "inference-engine" | "inference_engine" | "openvino" => {
                Ok(ComputeBackend::InferenceEngine)
            }
            "opencv" => Ok(ComputeBackend::OpenCv),
            "cuda" => Ok(ComputeBackend::Cuda),
            _ => Err(SelectorError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeTarget {
    #[default]
    Cpu,
    OpenCl,
    OpenClFp16,
    Vpu,
    Cuda,
    CudaFp16,
}

impl ComputeTarget {
    pub fn id(self) -> u32 {
        match self {
            ComputeTarget::Cpu => 0,
            ComputeTarget::OpenCl => 1,
            ComputeTarget::OpenClFp16 => 2,
            ComputeTarget::Vpu => 3,
            ComputeTarget::Cuda => 6,
            ComputeTarget::CudaFp16 => 7,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(ComputeTarget::Cpu),
            1 => Some(ComputeTarget::OpenCl),
            2 => Some(ComputeTarget::OpenClFp16),
            3 => Some(ComputeTarget::Vpu),
            6 => Some(ComputeTarget::Cuda),
            7 => Some(ComputeTarget::CudaFp16),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComputeTarget::Cpu => "cpu",
            ComputeTarget::OpenCl => "opencl",
            ComputeTarget::OpenClFp16 => "opencl-fp16",
            ComputeTarget::Vpu => "vpu",
            ComputeTarget::Cuda => "cuda",
            ComputeTarget::CudaFp16 => "cuda-fp16",
        }
    }

    pub fn is_cuda(self) -> bool {
        matches!(self, ComputeTarget::Cuda | ComputeTarget::CudaFp16)
    }
}

impl FromStr for ComputeTarget {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Ok(id) = key.parse::<u32>() {
            return Self::from_id(id).ok_or_else(|| SelectorError::UnknownTarget(s.to_string()));
        }
        match key.as_str() {
            "cpu" => Ok(ComputeTarget::Cpu),
            "opencl" => Ok(ComputeTarget::OpenCl),
            "opencl-fp16" | "opencl_fp16" => Ok(ComputeTarget::OpenClFp16),
            "vpu" | "myriad" => Ok(ComputeTarget::Vpu),
            "cuda" => Ok(ComputeTarget::Cuda),
            "cuda-fp16" | "cuda_fp16" => Ok(ComputeTarget::CudaFp16),
            _ => Err(SelectorError::UnknownTarget(s.to_string())),
        }
    }
}

impl fmt::Display for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

/// Requested backend/target pair. Backends honor what they can and log the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionPreference {
    pub backend: ComputeBackend,
    pub target: ComputeTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_round_trip() {
        for id in [0, 1, 2, 3, 5] {
            assert_eq!(ComputeBackend::from_id(id).unwrap().id(), id);
        }
        for id in [0, 1, 2, 3, 6, 7] {
            assert_eq!(ComputeTarget::from_id(id).unwrap().id(), id);
        }
    }

    #[test]
    fn test_parse_accepts_ids_and_names() {
        assert_eq!("3".parse::<ComputeBackend>(), Ok(ComputeBackend::OpenCv));
        assert_eq!("CUDA".parse::<ComputeBackend>(), Ok(ComputeBackend::Cuda));
        assert_eq!(" 2 ".parse::<ComputeTarget>(), Ok(ComputeTarget::OpenClFp16));
        assert_eq!("cuda_fp16".parse::<ComputeTarget>(), Ok(ComputeTarget::CudaFp16));
    }

    #[test]
    fn test_parse_rejects_unknown_selectors() {
        assert_eq!(
            "4".parse::<ComputeBackend>(),
            Err(SelectorError::UnknownBackend("4".to_string()))
        );
        assert!("fpga".parse::<ComputeTarget>().is_err());
        assert!("-1".parse::<ComputeTarget>().is_err());
    }

    #[test]
    fn test_display_shows_name_and_id() {
        assert_eq!(ComputeTarget::Vpu.to_string(), "vpu (3)");
        assert_eq!(ComputeBackend::Default.to_string(), "default (0)");
    }
}
