//! Runtime configuration for both pipeline stages.
//!
//! Values come from an optional `mlpipe.toml` in the application directory,
//! then `MLPIPE_*` environment overrides. Every stage receives the resolved
//! [`PipelineConfig`] explicitly; nothing depends on the process working
//! directory after loading.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::app_dirs;
use crate::http_client::RetryConfig;
use crate::pipeline::PipelineVariant;

/// File name of the TOML config inside the application directory.
pub const CONFIG_FILE_NAME: &str = "mlpipe.toml";

const DEFAULT_BIND: &str = "127.0.0.1:7071";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_MAX_DOWNLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Errors that may occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The application directory could not be prepared.
    #[error("Unable to resolve config directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse the TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A value (from the file or the environment) failed validation.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    /// The output directory could not be made absolute.
    #[error("Unable to resolve output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How the collector hands the table location to the trainer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// POST the payload to `trainer_url`.
    #[default]
    Http,
    /// Call the trainer in-process.
    Local,
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(TriggerMode::Http),
            "local" => Ok(TriggerMode::Local),
            other => Err(format!("expected `http` or `local`, got `{other}`")),
        }
    }
}

/// Retry block as written in TOML.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay_ms: defaults.base_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl From<RetrySettings> for RetryConfig {
    fn from(settings: RetrySettings) -> Self {
        RetryConfig {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

/// Raw file contents before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    bind: Option<String>,
    output_dir: Option<PathBuf>,
    variant: Option<PipelineVariant>,
    source_url: Option<String>,
    trainer_url: Option<String>,
    trigger: Option<TriggerMode>,
    max_download_bytes: Option<usize>,
    fetch_retry: Option<RetrySettings>,
    trigger_retry: Option<RetrySettings>,
}

/// Fully resolved configuration shared by the collector, trainer and server.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,
    /// Absolute directory receiving the table and all artifacts.
    pub output_dir: PathBuf,
    pub variant: PipelineVariant,
    /// Dataset the collector downloads.
    pub source_url: Url,
    /// Trainer endpoint used by [`TriggerMode::Http`].
    pub trainer_url: Url,
    pub trigger: TriggerMode,
    /// Upper bound on the downloaded dataset size.
    pub max_download_bytes: usize,
    pub fetch_retry: RetryConfig,
    pub trigger_retry: RetryConfig,
}

impl PipelineConfig {
    /// Defaults for `variant`, writing into `output_dir`.
    pub fn for_output_dir(
        variant: PipelineVariant,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let file = ConfigFile {
            variant: Some(variant),
            output_dir: Some(output_dir.into()),
            ..ConfigFile::default()
        };
        resolve(file)
    }

    /// Parse TOML text and apply overrides from `env`.
    pub fn from_toml_str(
        text: &str,
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut file: ConfigFile =
            toml::from_str(text).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?;
        apply_env_overrides(&mut file, env)?;
        resolve(file)
    }
}

/// Resolve the config file path inside the application directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the application directory and the process environment.
pub fn load() -> Result<PipelineConfig, ConfigError> {
    load_from_path(&config_path()?)
}

/// Load configuration from `path`, falling back to defaults when it does not exist.
pub fn load_from_path(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = if path.exists() {
        std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };
    PipelineConfig::from_toml_str(&text, path, |key| std::env::var(key).ok())
}

fn apply_env_overrides(
    file: &mut ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = env("MLPIPE_BIND") {
        file.bind = Some(value);
    }
    if let Some(value) = env("MLPIPE_OUTPUT_DIR") {
        file.output_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = env("MLPIPE_VARIANT") {
        let variant = value
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "MLPIPE_VARIANT",
                message,
            })?;
        file.variant = Some(variant);
    }
    if let Some(value) = env("MLPIPE_SOURCE_URL") {
        file.source_url = Some(value);
    }
    if let Some(value) = env("MLPIPE_TRAINER_URL") {
        file.trainer_url = Some(value);
    }
    if let Some(value) = env("MLPIPE_TRIGGER") {
        let mode = value
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "MLPIPE_TRIGGER",
                message,
            })?;
        file.trigger = Some(mode);
    }
    Ok(())
}

fn resolve(file: ConfigFile) -> Result<PipelineConfig, ConfigError> {
    let bind_text = file.bind.as_deref().unwrap_or(DEFAULT_BIND);
    let bind: SocketAddr = bind_text
        .parse()
        .map_err(|err: std::net::AddrParseError| ConfigError::InvalidValue {
            key: "bind",
            message: format!("{bind_text}: {err}"),
        })?;

    let output_dir = file
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let output_dir = std::path::absolute(&output_dir).map_err(|source| ConfigError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;

    let variant = file.variant.unwrap_or_default();
    let source_url = parse_url(
        "source_url",
        file.source_url
            .as_deref()
            .unwrap_or(variant.default_source_url()),
    )?;
    let trainer_url = match file.trainer_url.as_deref() {
        Some(text) => parse_url("trainer_url", text)?,
        None => parse_url("trainer_url", &default_trainer_url(bind))?,
    };

    let max_download_bytes = file
        .max_download_bytes
        .unwrap_or(DEFAULT_MAX_DOWNLOAD_BYTES);
    if max_download_bytes == 0 {
        return Err(ConfigError::InvalidValue {
            key: "max_download_bytes",
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(PipelineConfig {
        bind,
        output_dir,
        variant,
        source_url,
        trainer_url,
        trigger: file.trigger.unwrap_or_default(),
        max_download_bytes,
        fetch_retry: file.fetch_retry.unwrap_or_default().into(),
        trigger_retry: file.trigger_retry.unwrap_or_default().into(),
    })
}

/// The trainer route on this server, reachable even when bound to a wildcard address.
fn default_trainer_url(bind: SocketAddr) -> String {
    let host = if bind.ip().is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        bind.ip()
    };
    format!("http://{}/api/train", SocketAddr::new(host, bind.port()))
}

fn parse_url(key: &'static str, text: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(text).map_err(|err| ConfigError::InvalidValue {
        key,
        message: format!("{text}: {err}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key,
            message: format!("{text}: only http and https are supported"),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = PipelineConfig::from_toml_str("", Path::new("mlpipe.toml"), no_env).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7071".parse().unwrap());
        assert_eq!(config.variant, PipelineVariant::Iris);
        assert_eq!(config.trigger, TriggerMode::Http);
        assert!(config.output_dir.is_absolute());
        assert!(config.output_dir.ends_with("output"));
        assert_eq!(config.trainer_url.as_str(), "http://127.0.0.1:7071/api/train");
        assert_eq!(
            config.source_url.as_str(),
            PipelineVariant::Iris.default_source_url()
        );
        assert_eq!(config.fetch_retry, RetryConfig::default());
    }

    #[test]
    fn file_values_and_env_overrides_combine() {
        let text = r#"
            bind = "0.0.0.0:9000"
            variant = "iris"
            trigger = "local"

            [trigger_retry]
            max_attempts = 5
            base_delay_ms = 10
            max_delay_ms = 40
        "#;
        let env: HashMap<&str, &str> = [
            ("MLPIPE_VARIANT", "airline"),
            ("MLPIPE_OUTPUT_DIR", "/srv/mlpipe"),
        ]
        .into_iter()
        .collect();
        let config = PipelineConfig::from_toml_str(text, Path::new("mlpipe.toml"), |key| {
            env.get(key).map(|value| value.to_string())
        })
        .unwrap();

        assert_eq!(config.variant, PipelineVariant::Airline);
        assert_eq!(config.output_dir, PathBuf::from("/srv/mlpipe"));
        assert_eq!(config.trigger, TriggerMode::Local);
        assert_eq!(config.trainer_url.as_str(), "http://127.0.0.1:9000/api/train");
        assert_eq!(
            config.source_url.as_str(),
            PipelineVariant::Airline.default_source_url()
        );
        assert_eq!(config.trigger_retry.max_attempts, 5);
        assert_eq!(config.trigger_retry.max_delay, Duration::from_millis(40));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let path = Path::new("mlpipe.toml");
        assert!(matches!(
            PipelineConfig::from_toml_str("colour = \"blue\"", path, no_env),
            Err(ConfigError::ParseToml { .. })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("bind = \"nowhere\"", path, no_env),
            Err(ConfigError::InvalidValue { key: "bind", .. })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("trainer_url = \"ftp://host/x\"", path, no_env),
            Err(ConfigError::InvalidValue {
                key: "trainer_url",
                ..
            })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("", path, |key| {
                (key == "MLPIPE_TRIGGER").then(|| "queue".to_string())
            }),
            Err(ConfigError::InvalidValue {
                key: "MLPIPE_TRIGGER",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from_path(&dir.path().join(CONFIG_FILE_NAME));
        assert!(config.is_ok());
    }
}
