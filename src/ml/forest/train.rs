use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::model::{DecisionTree, RandomForestModel, TreeNode};

/// How many candidate features each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// Every feature.
    All,
    /// A fixed count, clamped to `1..=n_features`.
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Training hyperparameters for the forest.
#[derive(Debug, Clone)]
pub struct ForestOptions {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Train each tree on a bootstrap resample of the rows.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// In-memory dataset used for training.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Ordered feature names; each row of `x` has this length.
    pub features: Vec<String>,
    /// Ordered class names.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f64>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

impl TrainDataset {
    fn validate(&self) -> Result<(), String> {
        if self.x.len() != self.y.len() {
            return Err("Mismatched X/Y lengths".to_string());
        }
        if self.x.is_empty() {
            return Err("Empty dataset".to_string());
        }
        if self.classes.len() < 2 {
            return Err("Need at least 2 classes".to_string());
        }
        if self.features.is_empty() || self.features.len() > u16::MAX as usize {
            return Err(format!("Unsupported feature count {}", self.features.len()));
        }
        for (row_idx, row) in self.x.iter().enumerate() {
            if row.len() != self.features.len() {
                return Err(format!(
                    "Row {row_idx} has {} features but expected {}",
                    row.len(),
                    self.features.len()
                ));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(format!("Row {row_idx} contains non-finite values"));
            }
        }
        if let Some(label) = self.y.iter().find(|&&label| label >= self.classes.len()) {
            return Err(format!("Label {label} out of range"));
        }
        Ok(())
    }
}

/// Train a random forest classifier.
pub fn train_random_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<RandomForestModel, String> {
    dataset.validate()?;
    if options.n_trees == 0 {
        return Err("Need at least 1 tree".to_string());
    }

    let n = dataset.x.len();
    let d = dataset.features.len();
    let mut master = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_trees);
    let mut importances = vec![0.0f64; d];

    for _ in 0..options.n_trees {
        let mut rng = StdRng::seed_from_u64(master.random());
        let samples: Vec<usize> = if options.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let mut builder = TreeBuilder {
            dataset,
            options,
            max_features: options.max_features.resolve(d),
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; d],
        };
        builder.build(samples, 0);

        let tree_total: f64 = builder.importances.iter().sum();
        if tree_total > 0.0 {
            for (acc, v) in importances.iter_mut().zip(&builder.importances) {
                *acc += v / tree_total;
            }
        }
        trees.push(DecisionTree {
            nodes: builder.nodes,
        });
    }

    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    }

    let model = RandomForestModel {
        model_version: 1,
        features: dataset.features.clone(),
        classes: dataset.classes.clone(),
        feature_importances: importances,
        trees,
    };
    model.validate()?;
    Ok(model)
}

struct TreeBuilder<'a> {
    dataset: &'a TrainDataset,
    options: &'a ForestOptions,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    /// `n_left * gini_left + n_right * gini_right`.
    child_impurity: f64,
}

impl TreeBuilder<'_> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> u32 {
        let n_classes = self.dataset.classes.len();
        let counts = class_counts(&self.dataset.y, &samples, n_classes);
        let n = samples.len();
        let impurity = gini(&counts, n);

        let idx = self.nodes.len() as u32;
        self.nodes.push(leaf(&counts, n));

        let depth_reached = self.options.max_depth.is_some_and(|max| depth >= max);
        if impurity <= 0.0
            || depth_reached
            || n < self.options.min_samples_split.max(2)
            || n < 2 * self.options.min_samples_leaf.max(1)
        {
            return idx;
        }
        let Some(split) = self.best_split(&samples) else {
            return idx;
        };

        let x = &self.dataset.x;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&s| x[s][split.feature] <= split.threshold);
        self.importances[split.feature] += n as f64 * impurity - split.child_impurity;

        let left_idx = self.build(left, depth + 1);
        let right_idx = self.build(right, depth + 1);
        self.nodes[idx as usize] = TreeNode::Split {
            feature: split.feature as u16,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    /// Search candidate features in random order. At least `max_features` are
    /// examined; the search continues past that only while no valid split exists.
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let mut order: Vec<usize> = (0..self.dataset.features.len()).collect();
        order.shuffle(&mut self.rng);

        let mut best: Option<Split> = None;
        for (visited, &feature) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_for_feature(samples, feature)
                && best.is_none_or(|b| candidate.child_impurity < b.child_impurity)
            {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_split_for_feature(&self, samples: &[usize], feature: usize) -> Option<Split> {
        let x = &self.dataset.x;
        let y = &self.dataset.y;
        let n_classes = self.dataset.classes.len();
        let min_leaf = self.options.min_samples_leaf.max(1);

        let mut sorted = samples.to_vec();
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let n = sorted.len();
        let mut right_counts = class_counts(y, &sorted, n_classes);
        let mut left_counts = vec![0usize; n_classes];
        let mut best: Option<Split> = None;

        for i in 0..n - 1 {
            let label = y[sorted[i]];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let here = x[sorted[i]][feature];
            let next = x[sorted[i + 1]][feature];
            if here >= next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let child_impurity = n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right);
            if best.is_none_or(|b| child_impurity < b.child_impurity) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    child_impurity,
                });
            }
        }
        best
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &s in samples {
        counts[y[s]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize], n: usize) -> TreeNode {
    let n = n.max(1) as f64;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / n).collect(),
    }
}
