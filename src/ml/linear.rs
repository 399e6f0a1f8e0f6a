//! Ordinary least squares regression with an intercept.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

const PIVOT_EPS: f64 = 1e-12;

/// Fitted linear model: `intercept + sum(coefficients[j] * x[j])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Model format version.
    pub model_version: i64,
    /// Feature names aligned with `coefficients`.
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }

    pub fn predict_all(&self, x: &Array2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

/// Fit by solving the normal equations of the mean-centered problem.
pub fn fit_linear(
    x: &Array2<f64>,
    y: &Array1<f64>,
    features: Vec<String>,
) -> Result<LinearModel, String> {
    let (n, d) = x.dim();
    if n == 0 {
        return Err("Empty training set".to_string());
    }
    if y.len() != n {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if features.len() != d {
        return Err(format!(
            "Expected {d} feature names, got {}",
            features.len()
        ));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err("Training data contains non-finite values".to_string());
    }

    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| "Empty training set".to_string())?;
    let y_mean = y.mean().unwrap_or(0.0);
    let xc = x - &x_mean;
    let yc = y - y_mean;

    let gram = xc.t().dot(&xc);
    let rhs = xc.t().dot(&yc);
    let coefficients = solve(gram, rhs)?;
    let intercept = y_mean - x_mean.dot(&coefficients);

    Ok(LinearModel {
        model_version: 1,
        features,
        intercept,
        coefficients: coefficients.to_vec(),
    })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, String> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < PIVOT_EPS {
            return Err("Feature matrix is singular; features are collinear or constant".to_string());
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut out = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * out[k]).sum();
        out[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_relation() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0], [4.0, 3.0], [5.0, 8.0]];
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1])
            .collect();
        let model = fit_linear(&x, &y, vec!["a".into(), "b".into()]).unwrap();
        assert!((model.intercept - 3.0).abs() < 1e-9);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-9);

        let predicted = model.predict_all(&x);
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_feature_is_singular() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let y = array![1.0, 2.0, 3.0];
        let err = fit_linear(&x, &y, vec!["a".into(), "b".into()]).unwrap_err();
        assert!(err.contains("singular"));
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let x = array![[1.0], [2.0]];
        assert!(fit_linear(&x, &array![1.0], vec!["a".into()]).is_err());
        assert!(fit_linear(&x, &array![1.0, 2.0], vec![]).is_err());
        assert!(fit_linear(&x, &array![1.0, f64::NAN], vec!["a".into()]).is_err());
    }
}
