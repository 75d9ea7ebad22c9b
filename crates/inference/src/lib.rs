pub mod backend;
pub mod benchmark;
pub mod framework;
pub mod postprocessing;
pub mod selectors;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, ModelSource};
pub use benchmark::{ForwardOutcome, ForwardPolicy, TimingSample};
pub use framework::{Framework, FrameworkError};
pub use postprocessing::{Prediction, top_class, top_class_of};
pub use selectors::{ComputeBackend, ComputeTarget, ExecutionPreference, SelectorError};
