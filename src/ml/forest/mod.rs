//! Seeded random forest classifier.
//!
//! Bootstrapped CART trees split on Gini impurity over a random subset of
//! `sqrt(n_features)` candidate features per node. Class probabilities are the
//! mean of the per-tree leaf distributions. Training is fully deterministic for
//! a given seed, and models round-trip through JSON.

mod model;
mod train;

pub use model::{DecisionTree, RandomForestModel, TreeNode};
pub use train::{ForestOptions, MaxFeatures, TrainDataset, train_random_forest};
