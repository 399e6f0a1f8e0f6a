//! Time-series variant: linear regression on lag and rolling-mean features.

use std::path::Path;

use ndarray::{Array1, Array2};
use time::Date;
use tracing::info;

use super::artifacts::ArtifactWriter;
use super::{SUCCESS_MESSAGE, SavedFiles, TrainError, TrainOutcome};
use crate::dataset::source::{MONTH_COLUMN, PASSENGERS_COLUMN, format_date, parse_month};
use crate::dataset::{DatasetError, Table};
use crate::ml::features::{lag, rolling_mean};
use crate::ml::linear::fit_linear;
use crate::ml::metrics::RegressionMetrics;
use crate::ml::split::temporal_split;
use crate::pipeline::PipelineVariant;

pub const LAG: usize = 1;
pub const ROLLING_WINDOW: usize = 12;
/// Trailing rows held out for evaluation.
pub const TEST_SIZE: usize = 12;
pub const FEATURES: [&str; 2] = ["t-1", "rolling_mean"];

/// One month with both engineered features available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredRow {
    pub month: Date,
    pub target: f64,
    pub lag: f64,
    pub rolling_mean: f64,
}

impl EngineeredRow {
    fn features(&self) -> [f64; 2] {
        [self.lag, self.rolling_mean]
    }
}

/// Read `(month, passengers)` pairs from the table, sorted by month.
pub fn monthly_series(table: &Table) -> Result<Vec<(Date, f64)>, DatasetError> {
    let months = table.text_column(MONTH_COLUMN)?;
    let values = table.numeric_column(PASSENGERS_COLUMN)?;
    let mut series = months
        .iter()
        .zip(values)
        .enumerate()
        .map(|(row, (text, value))| {
            parse_month(text)
                .map(|month| (month, value))
                .ok_or_else(|| DatasetError::InvalidDate {
                    column: MONTH_COLUMN.to_string(),
                    row,
                    value: text.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    series.sort_by_key(|(month, _)| *month);
    Ok(series)
}

/// Derive lag and rolling-mean features, dropping rows where either is missing.
pub fn engineer(series: &[(Date, f64)]) -> Vec<EngineeredRow> {
    let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();
    let lagged = lag(&values, LAG);
    let rolling = rolling_mean(&values, ROLLING_WINDOW);
    series
        .iter()
        .zip(lagged.into_iter().zip(rolling))
        .filter_map(|(&(month, target), (previous, mean))| {
            Some(EngineeredRow {
                month,
                target,
                lag: previous?,
                rolling_mean: mean?,
            })
        })
        .collect()
}

fn design_matrix(rows: &[EngineeredRow]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), FEATURES.len()), |(i, j)| rows[i].features()[j])
}

pub(crate) fn run(table: &Table, output_dir: &Path) -> Result<TrainOutcome, TrainError> {
    let series = monthly_series(table)?;
    let rows = engineer(&series);
    let split = temporal_split(rows.len(), TEST_SIZE).map_err(TrainError::Model)?;
    let train_rows = &rows[..split.train.len()];
    let test_rows = &rows[split.train.len()..];

    let x_train = design_matrix(train_rows);
    let y_train: Array1<f64> = train_rows.iter().map(|row| row.target).collect();
    let features = FEATURES.iter().map(|name| name.to_string()).collect();
    let model = fit_linear(&x_train, &y_train, features).map_err(TrainError::Model)?;

    let predicted: Vec<i64> = model
        .predict_all(&design_matrix(test_rows))
        .iter()
        .map(|value| value.trunc() as i64)
        .collect();
    let actual: Vec<f64> = test_rows.iter().map(|row| row.target).collect();
    let predicted_f: Vec<f64> = predicted.iter().map(|&value| value as f64).collect();
    let metrics = RegressionMetrics::compute(&actual, &predicted_f).map_err(TrainError::Model)?;
    info!(
        mape = metrics.mape,
        rmse = metrics.rmse,
        train_rows = train_rows.len(),
        test_rows = test_rows.len(),
        "Linear model evaluated"
    );

    let names = PipelineVariant::Airline.artifact_names();
    let mut writer = ArtifactWriter::new(output_dir)?;
    let model_path = writer.json(names.model, &model)?;
    let metrics_path = writer.json(names.metrics, &metrics)?;
    let predictions_path = writer.csv(
        names.predictions,
        &[MONTH_COLUMN, "actual", "predicted"],
        test_rows.iter().zip(&predicted).map(|(row, predicted)| {
            [
                format_date(row.month),
                row.target.to_string(),
                predicted.to_string(),
            ]
        }),
    )?;
    let importance_path = writer.csv(
        names.feature_importance,
        &["feature", "importance"],
        model
            .features
            .iter()
            .zip(&model.coefficients)
            .map(|(feature, coefficient)| [feature.clone(), coefficient.to_string()]),
    )?;
    writer.commit()?;

    Ok(TrainOutcome {
        message: SUCCESS_MESSAGE.to_string(),
        accuracy: None,
        saved_files: SavedFiles {
            model: model_path,
            metrics: metrics_path,
            predictions: predictions_path,
            feature_importance: importance_path,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, Column};
    use tempfile::tempdir;
    use time::Month;

    fn month(index: usize) -> Date {
        let year = 1949 + (index / 12) as i32;
        let month = Month::try_from((index % 12) as u8 + 1).unwrap();
        Date::from_calendar_date(year, month, 1).unwrap()
    }

    fn airline_table(len: usize, shuffled: bool) -> Table {
        let mut order: Vec<usize> = (0..len).collect();
        if shuffled {
            order.reverse();
        }
        let months = order
            .iter()
            .map(|&i| Cell::Text(format_date(month(i))))
            .collect();
        let passengers = order
            .iter()
            .map(|&i| Cell::Number(100.0 + 2.0 * i as f64 + ((i % 12) as f64 - 5.5).abs()))
            .collect();
        Table::new(vec![
            Column::new(MONTH_COLUMN, months),
            Column::new(PASSENGERS_COLUMN, passengers),
        ])
        .unwrap()
    }

    #[test]
    fn engineered_rows_start_once_the_window_is_full() {
        let series = monthly_series(&airline_table(30, false)).unwrap();
        let rows = engineer(&series);
        assert_eq!(rows.len(), 30 - (ROLLING_WINDOW - 1));
        assert_eq!(rows[0].month, month(ROLLING_WINDOW - 1));
        assert_eq!(rows[0].lag, series[ROLLING_WINDOW - 2].1);
        let expected_mean =
            series[..ROLLING_WINDOW].iter().map(|(_, v)| v).sum::<f64>() / ROLLING_WINDOW as f64;
        assert!((rows[0].rolling_mean - expected_mean).abs() < 1e-9);
    }

    #[test]
    fn series_is_sorted_before_engineering() {
        let series = monthly_series(&airline_table(24, true)).unwrap();
        assert!(series.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn holdout_is_the_last_twelve_months_with_integer_predictions() {
        let dir = tempdir().unwrap();
        let outcome = run(&airline_table(60, true), dir.path()).unwrap();
        assert_eq!(outcome.accuracy, None);

        let text = std::fs::read_to_string(&outcome.saved_files.predictions).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("month,actual,predicted"));
        let rows: Vec<Vec<&str>> = lines.map(|line| line.split(',').collect()).collect();
        assert_eq!(rows.len(), TEST_SIZE);
        assert_eq!(rows[0][0], format_date(month(60 - TEST_SIZE)));
        assert_eq!(rows[TEST_SIZE - 1][0], format_date(month(59)));
        for row in &rows {
            row[2].parse::<i64>().unwrap();
        }

        let metrics: RegressionMetrics =
            serde_json::from_str(&std::fs::read_to_string(&outcome.saved_files.metrics).unwrap())
                .unwrap();
        assert!(metrics.mape >= 0.0 && metrics.mape < 1.0);
        assert!((metrics.rmse - metrics.mse.sqrt()).abs() < 1e-9);

        let importance = std::fs::read_to_string(&outcome.saved_files.feature_importance).unwrap();
        assert!(importance.starts_with("feature,importance\nt-1,"));
        assert!(importance.contains("\nrolling_mean,"));
    }

    #[test]
    fn too_short_series_fails_without_artifacts() {
        let dir = tempdir().unwrap();
        let err = run(&airline_table(20, false), dir.path()).unwrap_err();
        assert!(matches!(err, TrainError::Model(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
