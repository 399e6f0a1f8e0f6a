//! Holdout partitioning: seeded shuffle splits and temporal tail splits.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a fixed seed and hold out `ceil(n * test_fraction)` rows.
///
/// The same `(n, test_fraction, seed)` always yields the same partition.
pub fn shuffle_split(n: usize, test_fraction: f64, seed: u64) -> Result<SplitIndices, String> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(format!("test fraction must be in (0, 1), got {test_fraction}"));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(format!(
            "Cannot hold out {n_test} of {n} rows and keep a training set"
        ));
    }
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Hold out the last `test_len` rows; everything before them trains.
pub fn temporal_split(n: usize, test_len: usize) -> Result<SplitIndices, String> {
    if test_len == 0 || test_len >= n {
        return Err(format!(
            "Need more than {test_len} rows for a {test_len}-row holdout, got {n}"
        ));
    }
    let boundary = n - test_len;
    Ok(SplitIndices {
        train: (0..boundary).collect(),
        test: (boundary..n).collect(),
    })
}

/// Collect `values[i]` for each index.
pub fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}
