use std::collections::{BTreeMap, BTreeSet};

/// Maps categorical labels to dense indices in sorted label order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl LabelEncoder {
    /// Learn the label set from `values`.
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let classes: Vec<String> = values
            .iter()
            .map(|value| value.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = classes
            .iter()
            .cloned()
            .enumerate()
            .map(|(idx, name)| (name, idx))
            .collect();
        Self { classes, index }
    }

    /// Class names ordered by their encoded index.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<usize>, String> {
        values
            .iter()
            .map(|value| {
                self.index
                    .get(value.as_ref())
                    .copied()
                    .ok_or_else(|| format!("Unknown label: {}", value.as_ref()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_sorted_order() {
        let values = ["virginica", "setosa", "versicolor", "setosa"];
        let encoder = LabelEncoder::fit(&values);
        assert_eq!(encoder.classes(), ["setosa", "versicolor", "virginica"]);
        assert_eq!(encoder.transform(&values).unwrap(), vec![2, 0, 1, 0]);
        assert!(encoder.transform(&["rose"]).is_err());
    }
}
