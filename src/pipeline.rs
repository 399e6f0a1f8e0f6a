//! The two shipped pipeline variants and their fixed file layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which dataset the collector fetches and which model the trainer fits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVariant {
    /// Iris measurements, random forest classifier.
    #[default]
    Iris,
    /// Monthly airline passenger counts, lag/rolling-mean linear regression.
    Airline,
}

/// Fixed artifact file names for one variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArtifactNames {
    pub table: &'static str,
    pub model: &'static str,
    pub metrics: &'static str,
    pub predictions: &'static str,
    pub feature_importance: &'static str,
}

const IRIS_ARTIFACTS: ArtifactNames = ArtifactNames {
    table: "iris_dataset.csv",
    model: "iris_model.json",
    metrics: "iris_model_metrics.json",
    predictions: "iris_predictions.csv",
    feature_importance: "iris_feature_importance.csv",
};

const AIRLINE_ARTIFACTS: ArtifactNames = ArtifactNames {
    table: "output_file_airline_passengers.csv",
    model: "output_file_regression_model.json",
    metrics: "output_file_model_metrics.json",
    predictions: "output_file_model_predictions.csv",
    feature_importance: "output_file_feature_importance.csv",
};

impl PipelineVariant {
    pub const ALL: [PipelineVariant; 2] = [PipelineVariant::Iris, PipelineVariant::Airline];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineVariant::Iris => "iris",
            PipelineVariant::Airline => "airline",
        }
    }

    /// Public URL the collector downloads by default.
    pub fn default_source_url(self) -> &'static str {
        match self {
            PipelineVariant::Iris => {
                "https://archive.ics.uci.edu/ml/machine-learning-databases/iris/iris.data"
            }
            PipelineVariant::Airline => {
                "https://raw.githubusercontent.com/jbrownlee/Datasets/master/airline-passengers.csv"
            }
        }
    }

    pub fn artifact_names(self) -> ArtifactNames {
        match self {
            PipelineVariant::Iris => IRIS_ARTIFACTS,
            PipelineVariant::Airline => AIRLINE_ARTIFACTS,
        }
    }

    /// Body of the 400 response for a missing or unreadable table path.
    pub fn invalid_input_message(self) -> &'static str {
        match self {
            PipelineVariant::Iris => "Invalid or missing file path.",
            PipelineVariant::Airline => "File path is invalid or missing.",
        }
    }

    /// Location of the collected table inside `output_dir`.
    pub fn table_path(self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.artifact_names().table)
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PipelineVariant::ALL
            .into_iter()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown pipeline variant: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variant_names_case_insensitively() {
        assert_eq!("IRIS".parse::<PipelineVariant>(), Ok(PipelineVariant::Iris));
        assert_eq!(" airline ".parse::<PipelineVariant>(), Ok(PipelineVariant::Airline));
        assert!("boston".parse::<PipelineVariant>().is_err());
    }

    #[test]
    fn variants_never_share_artifact_names() {
        let iris = PipelineVariant::Iris.artifact_names();
        let airline = PipelineVariant::Airline.artifact_names();
        for (a, b) in [
            (iris.table, airline.table),
            (iris.model, airline.model),
            (iris.metrics, airline.metrics),
            (iris.predictions, airline.predictions),
            (iris.feature_importance, airline.feature_importance),
        ] {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn each_variant_has_its_own_rejection_text() {
        assert_eq!(
            PipelineVariant::Iris.invalid_input_message(),
            "Invalid or missing file path."
        );
        assert_eq!(
            PipelineVariant::Airline.invalid_input_message(),
            "File path is invalid or missing."
        );
    }
}
