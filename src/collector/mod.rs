//! Collector stage: download the source dataset, persist it as CSV and hand
//! it to the trainer.

pub mod fetch;
pub mod trigger;

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::PipelineConfig;
use crate::dataset::{DatasetError, source, write_table_file};
use crate::trainer::TriggerPayload;

pub use fetch::{FetchError, fetch_bytes};
pub use trigger::{HttpTrigger, LocalTrigger, TrainerTrigger, TriggerError};

/// What a collection run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOutcome {
    pub csv_path: PathBuf,
    /// Status the trainer answered the handoff with.
    pub trigger_status: u16,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Fetch, normalize and persist the configured dataset, then trigger training.
pub fn collect(
    config: &PipelineConfig,
    trigger: &dyn TrainerTrigger,
) -> Result<CollectOutcome, CollectError> {
    info!(
        variant = %config.variant,
        source = %config.source_url,
        "Collecting source dataset"
    );
    let bytes = fetch_bytes(
        &config.source_url,
        config.fetch_retry,
        config.max_download_bytes,
    )?;
    let table = source::parse_source(config.variant, &bytes)?;

    std::fs::create_dir_all(&config.output_dir).map_err(|source| CollectError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;
    let csv_path = config.variant.table_path(&config.output_dir);
    write_table_file(&csv_path, &table)?;
    info!(
        path = %csv_path.display(),
        rows = table.row_count(),
        "Data saved"
    );

    let trigger_status = trigger.trigger(&TriggerPayload::for_path(&csv_path))?;
    info!(status = trigger_status, "Trainer triggered");
    Ok(CollectOutcome {
        csv_path,
        trigger_status,
    })
}
