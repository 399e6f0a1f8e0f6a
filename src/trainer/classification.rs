//! Classification variant: seeded random forest over the iris-style table.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::artifacts::ArtifactWriter;
use super::{SUCCESS_MESSAGE, SavedFiles, TrainError, TrainOutcome};
use crate::dataset::Table;
use crate::dataset::source::IRIS_TARGET;
use crate::ml::forest::{ForestOptions, TrainDataset, train_random_forest};
use crate::ml::label::LabelEncoder;
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix, accuracy, classification_report};
use crate::ml::split::{gather, shuffle_split};
use crate::pipeline::PipelineVariant;

pub const TEST_FRACTION: f64 = 0.2;
pub const SEED: u64 = 42;
pub const N_TREES: usize = 100;

/// Contents of the metrics artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
}

/// Numeric feature matrix and encoded target extracted from a table.
struct Prepared {
    features: Vec<String>,
    encoder: LabelEncoder,
    x: Vec<Vec<f64>>,
    y: Vec<usize>,
}

fn prepare(table: &Table) -> Result<Prepared, TrainError> {
    let labels = table.text_column(IRIS_TARGET)?;
    let encoder = LabelEncoder::fit(&labels);
    let y = encoder.transform(&labels).map_err(TrainError::Model)?;

    let features: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| *name != IRIS_TARGET)
        .map(str::to_string)
        .collect();
    let columns = features
        .iter()
        .map(|name| table.numeric_column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let x = (0..table.row_count())
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect();
    Ok(Prepared {
        features,
        encoder,
        x,
        y,
    })
}

pub(crate) fn run(table: &Table, output_dir: &Path) -> Result<TrainOutcome, TrainError> {
    let Prepared {
        features,
        encoder,
        x,
        y,
    } = prepare(table)?;
    let split = shuffle_split(x.len(), TEST_FRACTION, SEED).map_err(TrainError::Model)?;

    let dataset = TrainDataset {
        features: features.clone(),
        classes: encoder.classes().to_vec(),
        x: gather(&x, &split.train),
        y: gather(&y, &split.train),
    };
    let options = ForestOptions {
        n_trees: N_TREES,
        seed: SEED,
        ..ForestOptions::default()
    };
    let model = train_random_forest(&dataset, &options).map_err(TrainError::Model)?;

    let y_test = gather(&y, &split.test);
    let y_pred: Vec<usize> = split
        .test
        .iter()
        .map(|&row| model.predict_class_index(&x[row]))
        .collect();
    let cm = ConfusionMatrix::from_labels(encoder.classes().len(), &y_test, &y_pred);
    let metrics = ClassificationMetrics {
        accuracy: accuracy(&cm),
        classification_report: classification_report(&cm, encoder.classes()),
    };
    info!(
        accuracy = metrics.accuracy,
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        "Random forest evaluated"
    );

    let names = PipelineVariant::Iris.artifact_names();
    let mut writer = ArtifactWriter::new(output_dir)?;
    let model_path = writer.json(names.model, &model)?;
    let metrics_path = writer.json(names.metrics, &metrics)?;
    let predictions_path = writer.csv(
        names.predictions,
        &["actual", "predicted"],
        y_test
            .iter()
            .zip(&y_pred)
            .map(|(actual, predicted)| [actual.to_string(), predicted.to_string()]),
    )?;
    let importance_path = writer.csv(
        names.feature_importance,
        &["feature", "importance"],
        features
            .iter()
            .zip(&model.feature_importances)
            .map(|(feature, importance)| [feature.clone(), importance.to_string()]),
    )?;
    writer.commit()?;

    Ok(TrainOutcome {
        message: SUCCESS_MESSAGE.to_string(),
        accuracy: Some(metrics.accuracy),
        saved_files: SavedFiles {
            model: model_path,
            metrics: metrics_path,
            predictions: predictions_path,
            feature_importance: importance_path,
        },
    })
}
