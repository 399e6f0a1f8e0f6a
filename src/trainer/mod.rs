//! Trainer stage: turn a persisted table into a model and its evaluation artifacts.

mod artifacts;
pub mod classification;
pub mod forecast;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::dataset::{DatasetError, read_table_file};
use crate::pipeline::PipelineVariant;

/// Success message returned to callers of the train endpoint.
pub const SUCCESS_MESSAGE: &str = "Model trained successfully!";

/// Handoff body sent from the collector to the trainer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl TriggerPayload {
    pub fn for_path(path: &Path) -> Self {
        Self {
            file_path: Some(path.display().to_string()),
        }
    }
}

/// Final locations of the four artifacts of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFiles {
    pub model: PathBuf,
    pub metrics: PathBuf,
    pub predictions: PathBuf,
    pub feature_importance: PathBuf,
}

/// Result of a successful training run, serialized as the train response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub message: String,
    /// Holdout accuracy; only reported by the classification variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub saved_files: SavedFiles,
}

#[derive(Debug, Error)]
pub enum TrainError {
    /// The table path is missing, not a file, or cannot be read.
    #[error("{}", .0.invalid_input_message())]
    InvalidInput(PipelineVariant),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Model training failed: {0}")]
    Model(String),
    #[error("Failed to write artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl TrainError {
    /// Whether the caller, not the pipeline, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TrainError::InvalidInput(_))
    }
}

/// Train the configured variant on the table named by `payload`.
///
/// The path is validated and the table read before anything is written; a
/// missing or unreadable table leaves the output directory untouched.
pub fn train(config: &PipelineConfig, payload: &TriggerPayload) -> Result<TrainOutcome, TrainError> {
    let path = validated_path(config.variant, payload)?;
    info!(
        variant = %config.variant,
        path = %path.display(),
        "Starting the ML pipeline"
    );
    let table = read_table_file(&path)
        .map_err(|err| classify_read_error(config.variant, &path, err))?;
    let outcome = match config.variant {
        PipelineVariant::Iris => classification::run(&table, &config.output_dir)?,
        PipelineVariant::Airline => forecast::run(&table, &config.output_dir)?,
    };
    info!(
        model = %outcome.saved_files.model.display(),
        metrics = %outcome.saved_files.metrics.display(),
        "Model training completed"
    );
    Ok(outcome)
}

fn validated_path(
    variant: PipelineVariant,
    payload: &TriggerPayload,
) -> Result<PathBuf, TrainError> {
    let raw = payload
        .file_path
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(TrainError::InvalidInput(variant))?;
    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(TrainError::InvalidInput(variant));
    }
    Ok(path)
}

/// Failing to open or read the file is the caller's problem; malformed
/// contents are not.
fn classify_read_error(variant: PipelineVariant, path: &Path, err: DatasetError) -> TrainError {
    let unreadable = match &err {
        DatasetError::Open { .. } | DatasetError::Io(_) => true,
        DatasetError::Csv(csv_err) => csv_err.is_io_error(),
        _ => false,
    };
    if unreadable {
        warn!(path = %path.display(), error = %err, "Table is not readable");
        TrainError::InvalidInput(variant)
    } else {
        TrainError::Dataset(err)
    }
}
