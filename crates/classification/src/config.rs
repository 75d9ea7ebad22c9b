use crate::cli::Cli;
use crate::display::DisplayKind;
use crate::service::PipelineSettings;
use crate::zoo::{CatalogError, ModelCatalog, ModelEntry};
use capture::InputSource;
use common::{Environment, env_non_empty};
use inference::{ExecutionPreference, ForwardPolicy, Framework, FrameworkError, ModelSource};
use preprocess::{BlobParams, ChannelOrder};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extra directories searched for model, config and class files.
pub const DATA_PATH_VAR: &str = "CLASSIFICATION_DATA_PATH";
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("File {0} not found")]
    FileNotFound(String),
    #[error("No model file given: pass --model or a catalog alias that names one")]
    MissingModel,
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub environment: Environment,
    pub otel_endpoint: Option<String>,
}

impl TelemetrySettings {
    pub fn from_env() -> Self {
        Self {
            environment: Environment::from_env(),
            otel_endpoint: env_non_empty(OTLP_ENDPOINT_VAR),
        }
    }
}

/// Everything the program needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClassificationConfig {
    pub model: ModelSource,
    pub classes: Option<PathBuf>,
    pub preference: ExecutionPreference,
    pub input: InputSource,
    pub display: DisplayKind,
    pub pipeline: PipelineSettings,
}

impl ClassificationConfig {
    /// Merge command-line values over the catalog entry for the alias over
    /// built-in defaults, and locate the files they name. The catalog is
    /// only read when an alias is given.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let entry = match &cli.alias {
            Some(alias) => catalog_entry(&cli.zoo, alias)?,
            None => ModelEntry::default(),
        };

        let roots = search_roots(&cli.zoo);

        let model_name = non_empty(cli.model.as_deref().or(entry.model.as_deref()))
            .ok_or(ConfigError::MissingModel)?;
        let model = find_file(model_name, &roots)?;
        let config = non_empty(cli.config.as_deref().or(entry.config.as_deref()))
            .map(|name| find_file(name, &roots))
            .transpose()?;
        let framework = Framework::detect(cli.framework.as_deref(), &model, config.as_deref())?;

        let classes = match &cli.classes {
            Some(path) => Some(path.clone()),
            None => non_empty(entry.classes.as_deref())
                .map(|name| find_file(name, &roots))
                .transpose()?,
        };

        Ok(Self {
            model: ModelSource {
                model,
                config,
                framework,
            },
            classes,
            preference: ExecutionPreference {
                backend: cli.backend,
                target: cli.target,
            },
            input: InputSource::resolve(cli.input.as_deref()),
            display: DisplayKind::resolve(cli.headless),
            pipeline: PipelineSettings {
                blob: blob_params(cli, &entry),
                batch_size: cli.batch_size as usize,
                output_layer: cli.output_layer.clone(),
                policy: ForwardPolicy::new(cli.warmup, cli.reps),
                ..Default::default()
            },
        })
    }
}

fn catalog_entry(zoo: &Path, alias: &str) -> Result<ModelEntry, CatalogError> {
    let Some(catalog) = ModelCatalog::load(zoo)? else {
        return Ok(ModelEntry::default());
    };
    let entry = catalog.get(alias)?;
    if entry.is_none() {
        tracing::warn!(alias, zoo = %zoo.display(), "Alias not found in model catalog");
    }
    Ok(entry.unwrap_or_default())
}

fn blob_params(cli: &Cli, entry: &ModelEntry) -> BlobParams {
    let width = cli.width.or(entry.width).unwrap_or(0);
    let height = cli.height.or(entry.height).unwrap_or(0);
    let size = (width > 0 && height > 0).then_some((width as u32, height as u32));

    BlobParams {
        scale: cli.scale.or(entry.scale).unwrap_or(1.0),
        mean: cli.mean.or(entry.mean).unwrap_or_default(),
        channel_order: ChannelOrder::from_swap_rb(cli.rgb.or(entry.rgb).unwrap_or(false)),
        size,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Directories searched after the working directory: the catalog's own
/// directory, then each entry of `CLASSIFICATION_DATA_PATH`.
pub fn search_roots(catalog: &Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    match catalog.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => roots.push(dir.to_path_buf()),
        _ => roots.push(PathBuf::from(".")),
    }
    if let Some(paths) = env_non_empty(DATA_PATH_VAR) {
        roots.extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
    }
    roots
}

/// Use `name` as is when it exists, else try `<root>/<name>` and
/// `<root>/dnn/<name>` for each root in order.
pub fn find_file(name: &str, roots: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    let path = Path::new(name);
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    roots
        .iter()
        .flat_map(|root| [root.join(name), root.join("dnn").join(name)])
        .find(|candidate| candidate.exists())
        .inspect(|found| tracing::debug!(name, found = %found.display(), "Resolved file"))
        .ok_or_else(|| ConfigError::FileNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;
    use tempfile::{TempDir, tempdir};

    fn workspace() -> TempDir {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("models.yml"),
            "%YAML:1.0\n\
             squeezenet:\n  \
               model: \"squeezenet.onnx\"\n  \
               mean: [104, 117, 123]\n  \
               scale: 0.5\n  \
               width: 227\n  \
               height: 227\n  \
               rgb: true\n  \
               classes: \"classes.txt\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("squeezenet.onnx"), b"onnx").unwrap();
        std::fs::write(dir.path().join("classes.txt"), "a\nb\n").unwrap();
        dir
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("classification").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    #[serial]
    fn test_catalog_entry_supplies_defaults() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        let cli = parse(&["squeezenet", "--zoo", zoo.to_str().unwrap(), "-i", "cat.jpg"]);

        let config = ClassificationConfig::from_cli(&cli).unwrap();

        assert_eq!(config.model.model, dir.path().join("squeezenet.onnx"));
        assert_eq!(config.model.framework, Framework::Onnx);
        assert_eq!(config.model.config, None);
        assert_eq!(config.classes, Some(dir.path().join("classes.txt")));

        let blob = &config.pipeline.blob;
        assert_eq!(blob.scale, 0.5);
        assert_eq!(blob.mean, [104.0, 117.0, 123.0]);
        assert_eq!(blob.channel_order, ChannelOrder::Rgb);
        assert_eq!(blob.size, Some((227, 227)));
        assert_eq!(config.pipeline.batch_size, 1);
        assert_eq!(config.input, InputSource::ImageFile(PathBuf::from("cat.jpg")));
    }

    #[test]
    #[serial]
    fn test_cli_overrides_catalog() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        let cli = parse(&[
            "squeezenet",
            "--zoo",
            zoo.to_str().unwrap(),
            "--scale",
            "2",
            "--mean",
            "1 2 3",
            "--rgb=false",
            "--width",
            "0",
            "--batch-size",
            "8",
            "--reps",
            "3",
            "--warmup",
            "0",
            "--output-layer",
            "prob",
        ]);

        let config = ClassificationConfig::from_cli(&cli).unwrap();
        let blob = &config.pipeline.blob;

        assert_eq!(blob.scale, 2.0);
        assert_eq!(blob.mean, [1.0, 2.0, 3.0]);
        assert_eq!(blob.channel_order, ChannelOrder::Bgr);
        assert_eq!(blob.size, None, "A non-positive width keeps the frame size");
        assert_eq!(config.pipeline.batch_size, 8);
        assert_eq!(config.pipeline.policy, ForwardPolicy::new(0, 3));
        assert_eq!(config.pipeline.output_layer.as_deref(), Some("prob"));
    }

    #[test]
    #[serial]
    fn test_defaults_without_catalog() {
        let dir = workspace();
        let model = dir.path().join("squeezenet.onnx");
        let cli = parse(&[
            "--zoo",
            dir.path().join("absent.yml").to_str().unwrap(),
            "--model",
            model.to_str().unwrap(),
        ]);

        let config = ClassificationConfig::from_cli(&cli).unwrap();
        let blob = &config.pipeline.blob;

        assert_eq!(blob.scale, 1.0);
        assert_eq!(blob.mean, [0.0; 3]);
        assert_eq!(blob.channel_order, ChannelOrder::Bgr);
        assert_eq!(blob.size, None);
        assert_eq!(config.classes, None);
        assert_eq!(config.input, InputSource::Camera(0));
        assert_eq!(config.pipeline.policy, ForwardPolicy::default());
    }

    #[test]
    #[serial]
    fn test_unknown_alias_without_model_fails() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        let cli = parse(&["resnet", "--zoo", zoo.to_str().unwrap()]);

        let err = ClassificationConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModel));
    }

    #[test]
    #[serial]
    fn test_missing_model_file_is_reported() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        let cli = parse(&["--zoo", zoo.to_str().unwrap(), "--model", "nowhere.onnx"]);

        let err = ClassificationConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(ref name) if name == "nowhere.onnx"));
    }

    #[test]
    #[serial]
    fn test_undetectable_framework_is_an_error() {
        let dir = workspace();
        let model = dir.path().join("weights.dat");
        std::fs::write(&model, b"?").unwrap();
        let cli = parse(&[
            "--zoo",
            dir.path().join("models.yml").to_str().unwrap(),
            "--model",
            model.to_str().unwrap(),
        ]);

        let err = ClassificationConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::Framework(_)));
    }

    #[test]
    #[serial]
    fn test_broken_catalog_ignored_without_alias() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        std::fs::write(&zoo, "squeezenet: [unclosed\n").unwrap();
        let model = dir.path().join("squeezenet.onnx");
        let cli = parse(&[
            "--zoo",
            zoo.to_str().unwrap(),
            "--model",
            model.to_str().unwrap(),
        ]);

        let config = ClassificationConfig::from_cli(&cli).unwrap();
        assert_eq!(config.model.model, model);
    }

    #[test]
    #[serial]
    fn test_unrelated_bad_entry_does_not_block_alias() {
        let dir = workspace();
        let zoo = dir.path().join("models.yml");
        let mut text = std::fs::read_to_string(&zoo).unwrap();
        text.push_str("yolo:\n  width: \"auto\"\n");
        std::fs::write(&zoo, text).unwrap();

        let cli = parse(&["squeezenet", "--zoo", zoo.to_str().unwrap()]);
        let config = ClassificationConfig::from_cli(&cli).unwrap();
        assert_eq!(config.pipeline.blob.size, Some((227, 227)));

        let cli = parse(&["yolo", "--zoo", zoo.to_str().unwrap()]);
        let err = ClassificationConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::Catalog(CatalogError::Entry { .. })));
    }

    #[test]
    fn test_find_file_search_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        std::fs::create_dir(second.path().join("dnn")).unwrap();
        std::fs::write(second.path().join("dnn").join("net.onnx"), b"").unwrap();
        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];

        assert_eq!(
            find_file("net.onnx", &roots).unwrap(),
            second.path().join("dnn").join("net.onnx")
        );

        std::fs::write(first.path().join("net.onnx"), b"").unwrap();
        assert_eq!(
            find_file("net.onnx", &roots).unwrap(),
            first.path().join("net.onnx"),
            "Earlier roots should win"
        );

        assert!(matches!(
            find_file("other.onnx", &roots),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_existing_path_is_used_as_is() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("net.onnx");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(find_file(path.to_str().unwrap(), &[]).unwrap(), path);
    }

    #[test]
    #[serial]
    fn test_search_roots_include_data_path() {
        let data = tempdir().unwrap();
        // SAFETY: tests touching the process environment are serialized.
        unsafe { env::set_var(DATA_PATH_VAR, data.path()) };

        let roots = search_roots(Path::new("zoo/models.yml"));

        unsafe { env::remove_var(DATA_PATH_VAR) };
        assert_eq!(roots, vec![PathBuf::from("zoo"), data.path().to_path_buf()]);
        assert_eq!(search_roots(Path::new("models.yml")), vec![PathBuf::from(".")]);
    }
}
