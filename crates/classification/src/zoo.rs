//! Model catalog (`models.yml`): default preprocessing parameters per model alias.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read model catalog {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model catalog {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid catalog entry '{alias}'")]
    Entry {
        alias: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Preprocessing defaults of one catalog entry. Keys not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelEntry {
    pub model: Option<String>,
    pub config: Option<String>,
    #[serde(default, deserialize_with = "deserialize_mean")]
    pub mean: Option<[f32; 3]>,
    pub scale: Option<f32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub rgb: Option<bool>,
    pub classes: Option<String>,
}

/// Catalog nodes by alias. Only the node that is asked for is interpreted,
/// so a malformed entry does not affect the others.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entries: BTreeMap<String, serde_yaml::Value>,
}

impl ModelCatalog {
    /// Parse catalog text. A leading `%YAML:1.0` line (OpenCV `FileStorage`
    /// style, not valid YAML) is skipped.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        let text = strip_directive(text);
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self {
            entries: serde_yaml::from_value(value)?,
        })
    }

    /// Load the catalog at `path`. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, CatalogError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Model catalog not found");
                return Ok(None);
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let catalog = Self::parse(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), entries = catalog.len(), "Model catalog loaded");
        Ok(Some(catalog))
    }

    /// Entry for `alias`, or `None` when the catalog has no such alias.
    pub fn get(&self, alias: &str) -> Result<Option<ModelEntry>, CatalogError> {
        self.entries
            .get(alias)
            .map(|node| {
                serde_yaml::from_value(node.clone()).map_err(|source| CatalogError::Entry {
                    alias: alias.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strip_directive(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("%YAML") {
        trimmed.split_once('\n').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

/// Parse a mean given as `"104 117 123"` or `"104, 117, 123"`.
///
/// Missing trailing channels are zero, as with a partially specified scalar.
pub fn parse_mean(text: &str) -> Result<[f32; 3], String> {
    let values = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f32>()
                .map_err(|_| format!("invalid mean component '{s}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    mean_from_values(&values)
}

fn mean_from_values(values: &[f32]) -> Result<[f32; 3], String> {
    if values.is_empty() || values.len() > 3 {
        return Err(format!(
            "mean needs 1 to 3 components, got {}",
            values.len()
        ));
    }
    let mut mean = [0.0; 3];
    mean[..values.len()].copy_from_slice(values);
    Ok(mean)
}

fn deserialize_mean<'de, D>(deserializer: D) -> Result<Option<[f32; 3]>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mean {
        Values(Vec<f32>),
        Single(f32),
        Text(String),
    }

    let mean = match Option::<Mean>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Mean::Values(values)) => mean_from_values(&values),
        Some(Mean::Single(value)) => mean_from_values(&[value]),
        Some(Mean::Text(text)) => parse_mean(&text),
    };
    mean.map(Some).map_err(serde::de::Error::custom)
}
