use std::fmt;

use crate::error::{NetworkError, Result};

use super::dataset::ClassPosition;

/// A scanned input column: either an ordered set of category strings or a
/// continuous numeric range.
#[derive(Debug, Clone)]
enum Attribute {
    /// Distinct values in first-seen order.
    Categorical(Vec<String>),
    /// Observed bounds; values outside them still normalize linearly and
    /// land outside the target range.
    Continuous { min: f64, max: f64 },
}

/// Normalizes arbitrary comma-separated classification data into numeric
/// vectors for the network.
///
/// One scan over the dataset classifies every non-class column as
/// continuous (all values parse as numbers) or categorical (distinct
/// values in first-seen order), and collects the distinct class labels.
/// Continuous values map linearly into the target range against their
/// scanned bounds; categorical values map to evenly spaced buckets within
/// the same range. The default target range is [0, 1].
pub struct ClassificationNormalizer {
    attributes: Vec<Attribute>,
    classes: Vec<String>,
    dataset: Vec<Vec<String>>,
    class_position: usize,
    range_low: f64,
    range_high: f64,
}

impl ClassificationNormalizer {
    pub fn new() -> ClassificationNormalizer {
        ClassificationNormalizer::with_target_range(0.0, 1.0)
    }

    /// Chooses a different normalization target range, e.g. [-1, 1] for
    /// hyperbolic-tangent layers.
    pub fn with_target_range(low: f64, high: f64) -> ClassificationNormalizer {
        ClassificationNormalizer {
            attributes: Vec::new(),
            classes: Vec::new(),
            dataset: Vec::new(),
            class_position: 0,
            range_low: low,
            range_high: high,
        }
    }

    /// Adds the dataset and scans it for attributes and classes.
    ///
    /// The matrix must be rectangular; the class column is resolved
    /// against the row width.
    pub fn add_dataset(&mut self, rows: &[Vec<String>], class_position: ClassPosition) -> Result<()> {
        if rows.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }
        let width = rows[0].len();
        for row in rows {
            if row.len() != width {
                return Err(NetworkError::DimensionMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        self.class_position = class_position.resolve(width);
        self.dataset = rows.to_vec();
        self.scan()
    }

    /// Collects per-column distinct values and numeric ranges.
    fn scan(&mut self) -> Result<()> {
        let width = self.dataset[0].len();
        let mut distinct: Vec<Vec<String>> = vec![Vec::new(); width];
        let mut numeric = vec![true; width];

        for row in &self.dataset {
            for (col, value) in row.iter().enumerate() {
                if !distinct[col].contains(value) {
                    if numeric[col] && value.parse::<f64>().is_err() {
                        numeric[col] = false;
                    }
                    distinct[col].push(value.clone());
                }
            }
        }

        self.attributes.clear();
        self.classes.clear();
        for (col, values) in distinct.into_iter().enumerate() {
            if col == self.class_position {
                self.classes = values;
            } else if numeric[col] {
                let mut min = f64::MAX;
                let mut max = f64::MIN;
                for value in &values {
                    let number: f64 =
                        value.parse().map_err(|_| NetworkError::NotNumeric(value.clone()))?;
                    min = min.min(number);
                    max = max.max(number);
                }
                self.attributes.push(Attribute::Continuous { min, max });
            } else {
                self.attributes.push(Attribute::Categorical(values));
            }
        }
        Ok(())
    }

    /// Generates the normalized training set: one input row per sample and
    /// a one-hot ideal row sized to the class count.
    pub fn normalized_training_data(&self) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        if self.dataset.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        let mut input_data = Vec::with_capacity(self.dataset.len());
        let mut ideal_data = Vec::with_capacity(self.dataset.len());

        for row in &self.dataset {
            let mut inputs = Vec::with_capacity(self.attributes.len());
            let mut attr_idx = 0;
            for (col, value) in row.iter().enumerate() {
                if col == self.class_position {
                    continue;
                }
                inputs.push(self.normalized_value(&self.attributes[attr_idx], value)?);
                attr_idx += 1;
            }

            let label = &row[self.class_position];
            let class_idx = self
                .classes
                .iter()
                .position(|class| class == label)
                .ok_or_else(|| NetworkError::UnknownCategory(label.clone()))?;
            let mut ideal = vec![0.0; self.classes.len()];
            ideal[class_idx] = 1.0;

            input_data.push(inputs);
            ideal_data.push(ideal);
        }

        Ok((input_data, ideal_data))
    }

    /// Normalizes one raw sample (class column excluded) into the target
    /// range, in attribute order.
    pub fn normalize_attributes<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<f64>> {
        if values.len() != self.attributes.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.attributes.len(),
                actual: values.len(),
            });
        }
        values
            .iter()
            .zip(&self.attributes)
            .map(|(value, attribute)| self.normalized_value(attribute, value.as_ref()))
            .collect()
    }

    fn normalized_value(&self, attribute: &Attribute, value: &str) -> Result<f64> {
        let t = match attribute {
            Attribute::Categorical(categories) => {
                let position = categories
                    .iter()
                    .position(|category| category == value)
                    .ok_or_else(|| NetworkError::UnknownCategory(value.to_string()))?;
                position as f64 / categories.len() as f64
            }
            Attribute::Continuous { min, max } => {
                let number: f64 =
                    value.parse().map_err(|_| NetworkError::NotNumeric(value.to_string()))?;
                let span = max - min;
                if span == 0.0 {
                    // A single-valued column collapses to the lower bound.
                    0.0
                } else {
                    (number - min) / span
                }
            }
        };
        Ok(self.range_low + t * (self.range_high - self.range_low))
    }

    /// The class whose output unit fired strongest.
    pub fn best_class_match(&self, outputs: &[f64]) -> Result<&str> {
        let length = outputs.len().min(self.classes.len());
        if length == 0 {
            return Err(NetworkError::EmptyDataset);
        }
        let mut best = 0;
        for i in 1..length {
            if outputs[i] > outputs[best] {
                best = i;
            }
        }
        Ok(&self.classes[best])
    }

    /// All classes with their match percentages, e.g. `edible(93%) poisonous( 6%)`.
    pub fn class_match_string(&self, outputs: &[f64]) -> String {
        let length = outputs.len().min(self.classes.len());
        let mut result = String::new();
        for i in 0..length {
            result.push_str(&format!("{}({:2}%) ", self.classes[i], (outputs[i] * 100.0) as i64));
        }
        result
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl Default for ClassificationNormalizer {
    fn default() -> Self {
        ClassificationNormalizer::new()
    }
}

impl fmt::Display for ClassificationNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, attribute) in self.attributes.iter().enumerate() {
            match attribute {
                Attribute::Categorical(categories) => {
                    writeln!(f, "Attr {index}: {categories:?}")?;
                }
                Attribute::Continuous { min, max } => {
                    writeln!(f, "Attr {index}: continuous ({min} - {max})")?;
                }
            }
        }
        writeln!(f, "Classes: {:?}", self.classes)
    }
}
