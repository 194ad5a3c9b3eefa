use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PreprocessorError;
use crate::evaluation::stable_mean;
use crate::matrix::FeatureMatrix;
use crate::schema::{CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS, ShotRecord};

// Imputed value (and min/max) for a numerical column with no observed values.
pub const ALL_MISSING_FILL: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub column: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl NumericStats {
    fn fit(column: &str, values: impl Iterator<Item = Option<f64>>) -> Self {
        let observed: Vec<f64> = values.flatten().collect();
        let Some(mean) = stable_mean(observed.iter().copied()) else {
            return Self {
                column: column.to_string(),
                mean: ALL_MISSING_FILL,
                min: ALL_MISSING_FILL,
                max: ALL_MISSING_FILL,
            };
        };
        Self {
            column: column.to_string(),
            mean,
            min: observed.iter().copied().fold(f64::INFINITY, f64::min),
            max: observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn impute(&self, value: Option<f64>) -> f64 {
        value.unwrap_or(self.mean)
    }

    /// Min-max scaling onto the training range. No clipping outside it.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        let range = if range == 0.0 { 1.0 } else { range };
        (value - self.min) / range
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocab {
    pub column: String,
    // Sorted, deduplicated; position = one-hot slot.
    pub categories: Vec<String>,
}

impl CategoryVocab {
    fn fit<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> Self {
        let set: BTreeSet<&str> = values.collect();
        Self {
            column: column.to_string(),
            categories: set.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn slot(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub imputed: usize,
    pub unseen_categories: usize,
}

/// Frozen preprocessing state: mean imputation + min-max scaling for the
/// numerical columns, one-hot encoding for the categorical ones.
///
/// Output layout is the numerical columns in schema order followed by one
/// block per categorical column. `under_pressure` is not part of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericStats>,
    categorical: Vec<CategoryVocab>,
}

impl Preprocessor {
    pub fn fit(records: &[ShotRecord]) -> Self {
        let numeric = NUMERICAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| NumericStats::fit(name, records.iter().map(|r| r.numerical[idx])))
            .collect();
        let categorical = CATEGORICAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                CategoryVocab::fit(name, records.iter().map(|r| r.categorical[idx].as_str()))
            })
            .collect();
        Self {
            numeric,
            categorical,
        }
    }

    pub fn numeric_stats(&self) -> &[NumericStats] {
        &self.numeric
    }

    pub fn vocabularies(&self) -> &[CategoryVocab] {
        &self.categorical
    }

    pub fn output_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(CategoryVocab::width).sum::<usize>()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.output_width());
        names.extend(self.numeric.iter().map(|s| s.column.clone()));
        for vocab in &self.categorical {
            names.extend(
                vocab
                    .categories
                    .iter()
                    .map(|c| format!("{}={}", vocab.column, c)),
            );
        }
        names
    }

    pub fn transform(&self, records: &[ShotRecord]) -> FeatureMatrix {
        self.transform_with_report(records).0
    }

    pub fn transform_with_report(&self, records: &[ShotRecord]) -> (FeatureMatrix, TransformReport) {
        let mut out = FeatureMatrix::zeros(records.len(), self.output_width());
        let mut report = TransformReport::default();

        for (row_idx, record) in records.iter().enumerate() {
            let row = out.row_mut(row_idx);
            for (col, stats) in self.numeric.iter().enumerate() {
                let raw = record.numerical.get(col).copied().flatten();
                if raw.is_none() {
                    report.imputed += 1;
                }
                row[col] = stats.scale(stats.impute(raw));
            }

            let mut offset = self.numeric.len();
            for (idx, vocab) in self.categorical.iter().enumerate() {
                let value = record.categorical.get(idx).map(String::as_str).unwrap_or("");
                match vocab.slot(value) {
                    Some(slot) => row[offset + slot] = 1.0,
                    None => {
                        report.unseen_categories += 1;
                        debug!(column = %vocab.column, value, "unseen category, encoded as zeros");
                    }
                }
                offset += vocab.width();
            }
        }

        (out, report)
    }

    /// Checks the invariants a deserialized state must hold.
    pub fn validate(&self) -> Result<(), PreprocessorError> {
        let numeric_names: Vec<&str> = self.numeric.iter().map(|s| s.column.as_str()).collect();
        if numeric_names != NUMERICAL_COLUMNS {
            return Err(PreprocessorError::Columns {
                kind: "numerical",
                found: numeric_names.into_iter().map(str::to_string).collect(),
            });
        }
        let categorical_names: Vec<&str> =
            self.categorical.iter().map(|v| v.column.as_str()).collect();
        if categorical_names != CATEGORICAL_COLUMNS {
            return Err(PreprocessorError::Columns {
                kind: "categorical",
                found: categorical_names.into_iter().map(str::to_string).collect(),
            });
        }
        for s in &self.numeric {
            if !(s.mean.is_finite() && s.min.is_finite() && s.max.is_finite()) || s.min > s.max {
                return Err(PreprocessorError::Statistics(s.column.clone()));
            }
        }
        for v in &self.categorical {
            if v.categories.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PreprocessorError::UnsortedVocabulary(v.column.clone()));
            }
        }
        Ok(())
    }
}
