use anyhow::Context;
use capture::open_source;
use classification::{
    ClassLabels, ClassificationConfig, ClassificationService, Cli, LoopSummary, ParseOutcome,
    StopReason, TelemetrySettings, install_shutdown_handlers, open_display, parse_args,
};
use common::{TelemetryGuard, setup_logging};
use inference::InferenceBackend;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[cfg(feature = "ort-backend")]
use inference::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The 'ort-backend' feature must be enabled to build the classification binary");

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        ParseOutcome::Run(cli) => cli,
        ParseOutcome::Exit(code) => return code,
    };

    let telemetry = TelemetrySettings::from_env();
    let _telemetry = match telemetry.otel_endpoint.as_deref() {
        Some(endpoint) => {
            match TelemetryGuard::init("classification", endpoint, telemetry.environment) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    eprintln!("Error: failed to initialize telemetry: {e:#}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            setup_logging(telemetry.environment);
            None
        }
    };

    match run(&cli) {
        Ok(summary) => {
            tracing::info!(frames = summary.frames, stop = ?summary.stop, "Classification finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Classification failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<LoopSummary> {
    let shutdown = install_shutdown_handlers()?;

    let config = ClassificationConfig::from_cli(cli)?;
    tracing::info!(config = ?config, "Loaded configuration");

    let labels = match &config.classes {
        Some(path) => ClassLabels::load(path)?,
        None => ClassLabels::default(),
    };

    tracing::info!(
        model = %config.model.model.display(),
        framework = %config.model.framework,
        backend = %config.preference.backend,
        target = %config.preference.target,
        "Loading model"
    );
    let backend = Backend::load_model(&config.model, config.preference)
        .with_context(|| format!("Failed to load model {}", config.model.model.display()))?;
    tracing::info!("Model loaded successfully");

    let mut source = open_source(&config.input).context("Failed to open input")?;
    let mut display = open_display(config.display, Arc::clone(&shutdown))?;

    if shutdown.load(Ordering::SeqCst) {
        tracing::info!("Shutdown requested before the first frame");
        return Ok(LoopSummary {
            frames: 0,
            stop: StopReason::QuitRequested,
        });
    }

    let mut service = ClassificationService::new(backend, labels, config.pipeline);
    service.run(&mut source, &mut display)
}
