//! Handoff from the collector to the trainer.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};
use url::Url;

use crate::config::{PipelineConfig, TriggerMode};
use crate::http_client::{self, RetryConfig};
use crate::trainer::{self, TriggerPayload};

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Trainer at {url} is unreachable: {message}")]
    Unreachable { url: Url, message: String },
}

/// Starts a training run for a freshly persisted table.
///
/// Returns the trainer's HTTP-style status. A non-2xx status is a normal
/// result; only failing to reach the trainer at all is an error.
pub trait TrainerTrigger: Send + Sync {
    fn trigger(&self, payload: &TriggerPayload) -> Result<u16, TriggerError>;
}

/// POSTs the payload as JSON to a remote train endpoint.
#[derive(Debug, Clone)]
pub struct HttpTrigger {
    url: Url,
    retry: RetryConfig,
}

impl HttpTrigger {
    pub fn new(url: Url, retry: RetryConfig) -> Self {
        Self { url, retry }
    }
}

impl TrainerTrigger for HttpTrigger {
    fn trigger(&self, payload: &TriggerPayload) -> Result<u16, TriggerError> {
        // Once the request may have reached the trainer a retry could start a second run.
        let result = http_client::retry_with_backoff(
            self.retry,
            || http_client::agent().post(self.url.as_str()).send_json(payload),
            http_client::is_connect_failure,
        );
        match result {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(status, _)) => {
                warn!(url = %self.url, status, "Trainer rejected the handoff");
                Ok(status)
            }
            Err(ureq::Error::Transport(transport)) => Err(TriggerError::Unreachable {
                url: self.url.clone(),
                message: transport.to_string(),
            }),
        }
    }
}

/// Runs the trainer in the current process.
#[derive(Debug, Clone)]
pub struct LocalTrigger {
    config: PipelineConfig,
}

impl LocalTrigger {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

impl TrainerTrigger for LocalTrigger {
    fn trigger(&self, payload: &TriggerPayload) -> Result<u16, TriggerError> {
        match trainer::train(&self.config, payload) {
            Ok(_) => Ok(200),
            Err(err) if err.is_client_error() => Ok(400),
            Err(err) => {
                error!(error = %err, "In-process training failed");
                Ok(500)
            }
        }
    }
}

/// Build the trigger selected by `config.trigger`.
pub fn from_config(config: &PipelineConfig) -> Arc<dyn TrainerTrigger> {
    match config.trigger {
        TriggerMode::Http => Arc::new(HttpTrigger::new(
            config.trainer_url.clone(),
            config.trigger_retry,
        )),
        TriggerMode::Local => Arc::new(LocalTrigger::new(config.clone())),
    }
}
