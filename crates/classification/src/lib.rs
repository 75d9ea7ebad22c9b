pub mod cli;
pub mod config;
pub mod display;
pub mod labels;
pub mod overlay;
pub mod service;
pub mod signals;
pub mod zoo;

pub use cli::{Cli, ParseOutcome, parse_args};
pub use config::{ClassificationConfig, ConfigError, TelemetrySettings};
pub use display::{DisplayKind, DisplaySurface, LogDisplay, open_display};
pub use labels::{ClassLabels, LabelError};
pub use overlay::{OverlayLine, OverlayStyle};
pub use service::{ClassificationService, LoopSummary, PipelineSettings, StopReason};
pub use signals::install_shutdown_handlers;
pub use zoo::{ModelCatalog, ModelEntry};
