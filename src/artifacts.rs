//! Training artifacts on disk
//!
//! The producer writes two JSON files into one directory: the fitted
//! classifier and a metadata record describing its classes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::model::SoftmaxRegression;

/// Identifier reported by `/health` and recorded in the metadata
pub const MODEL_NAME: &str = "iris_clf";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not a valid artifact: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("metadata is inconsistent: {0}")]
    Inconsistent(String),
}

/// Metadata record written next to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Class labels, index = class id
    pub target_names: Vec<String>,

    /// Held-out accuracy in [0, 1]
    pub accuracy: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Check the record on its own: accuracy range and unique labels.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(ArtifactError::Inconsistent(format!(
                "accuracy {} outside [0, 1]",
                self.accuracy
            )));
        }
        if self.target_names.is_empty() {
            return Err(ArtifactError::Inconsistent("no target names".to_string()));
        }
        for (i, name) in self.target_names.iter().enumerate() {
            if self.target_names[..i].contains(name) {
                return Err(ArtifactError::Inconsistent(format!(
                    "duplicate target name '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}

pub fn load_model(path: &Path) -> Result<SoftmaxRegression, ArtifactError> {
    read_json(path)
}

pub fn load_metadata(path: &Path) -> Result<Metadata, ArtifactError> {
    let metadata: Metadata = read_json(path)?;
    metadata.validate()?;
    Ok(metadata)
}

/// Write the model, creating parent directories. Overwrites.
pub fn save_model(path: &Path, model: &SoftmaxRegression) -> Result<(), ArtifactError> {
    write_json(path, model)
}

/// Write the metadata (pretty-printed), creating parent directories. Overwrites.
pub fn save_metadata(path: &Path, metadata: &Metadata) -> Result<(), ArtifactError> {
    write_json(path, metadata)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let write_err = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json + "\n").map_err(write_err)
}
