//! Two-stage ML pipeline: a collector that downloads and persists a dataset,
//! and a trainer that fits a model on it and writes evaluation artifacts.
/// Application directory resolution.
pub mod app_dirs;
/// Collector stage.
pub mod collector;
/// Configuration file and environment overrides.
pub mod config;
/// Tables, CSV persistence and source normalization.
pub mod dataset;
/// Shared outbound HTTP helpers.
pub mod http_client;
/// Tracing setup.
pub mod logging;
/// Models, splits and metrics.
pub mod ml;
/// Pipeline variants and their artifact names.
pub mod pipeline;
/// HTTP server.
pub mod server;
/// Trainer stage.
pub mod trainer;
