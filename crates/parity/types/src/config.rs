//! Reading and writing configuration models.
//!
//! The format is chosen from the file extension: `.json` or `.yaml`/`.yml`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::change::{ExpectedChange, Perturbation};
use crate::error::{ConfigError, ConfigResult};
use crate::tolerance::ToleranceSpec;

/// Supported structured-text encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Deserialize a model from text in the given format.
pub fn parse_model<T: DeserializeOwned>(text: &str, format: FileFormat, path: &Path) -> ConfigResult<T> {
    match format {
        FileFormat::Json => serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        FileFormat::Yaml => serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load a model from a `.json` or `.yaml` file.
pub fn load_model<T: DeserializeOwned>(path: impl AsRef<Path>) -> ConfigResult<T> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_model(&text, format, path)
}

/// Save a model to a `.json` (pretty-printed) or `.yaml` file.
pub fn save_model<T: Serialize>(model: &T, path: impl AsRef<Path>) -> ConfigResult<()> {
    let path = path.as_ref();
    let text = match FileFormat::from_path(path)? {
        FileFormat::Json => serde_json::to_string_pretty(model).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        FileFormat::Yaml => serde_yaml::to_string(model).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
    };
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_tolerance(path: impl AsRef<Path>) -> ConfigResult<ToleranceSpec> {
    load_model(path)
}

pub fn load_expected_changes(path: impl AsRef<Path>) -> ConfigResult<Vec<ExpectedChange>> {
    load_model(path)
}

pub fn load_perturbations(path: impl AsRef<Path>) -> ConfigResult<Vec<Perturbation>> {
    load_model(path)
}
