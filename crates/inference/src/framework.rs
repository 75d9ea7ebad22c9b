use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("unknown framework '{0}'")]
    UnknownHint(String),
    #[error("cannot determine the framework of {0}; pass --framework")]
    Undetectable(String),
}

/// Origin framework of a model, which decides how it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    Onnx,
    Caffe,
    TensorFlow,
    Torch,
    Darknet,
    OpenVino,
}

impl Framework {
    pub fn from_hint(hint: &str) -> Result<Self, FrameworkError> {
        match hint.trim().to_lowercase().as_str() {
            "onnx" => Ok(Framework::Onnx),
            "caffe" => Ok(Framework::Caffe),
            "tensorflow" | "tf" => Ok(Framework::TensorFlow),
            "torch" => Ok(Framework::Torch),
            "darknet" => Ok(Framework::Darknet),
            "dldt" | "openvino" => Ok(Framework::OpenVino),
            _ => Err(FrameworkError::UnknownHint(hint.to_string())),
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "onnx" => Some(Framework::Onnx),
            "caffemodel" | "prototxt" => Some(Framework::Caffe),
            "pb" | "pbtxt" => Some(Framework::TensorFlow),
            "t7" | "net" => Some(Framework::Torch),
            "weights" | "cfg" => Some(Framework::Darknet),
            "bin" | "xml" => Some(Framework::OpenVino),
            _ => None,
        }
    }

    /// The hint wins when given; otherwise the model extension, then the
    /// config extension.
    pub fn detect(
        hint: Option<&str>,
        model: &Path,
        config: Option<&Path>,
    ) -> Result<Self, FrameworkError> {
        if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
            return Self::from_hint(hint);
        }

        Self::from_extension(model)
            .or_else(|| config.and_then(Self::from_extension))
            .ok_or_else(|| FrameworkError::Undetectable(model.display().to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Framework::Onnx => "onnx",
            Framework::Caffe => "caffe",
            Framework::TensorFlow => "tensorflow",
            Framework::Torch => "torch",
            Framework::Darknet => "darknet",
            Framework::OpenVino => "openvino",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
