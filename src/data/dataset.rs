use std::fs::File;
use std::io::{self, BufRead, BufReader};

use crate::error::{NetworkError, Result};

const DELIMITER: char = ',';
const TRAINING_SET_PERCENTAGE: usize = 80;

/// Position of the class column within each sample row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPosition {
    First,
    Last,
    Column(usize),
}

impl ClassPosition {
    /// Resolves to a concrete column index, clamped to the row width.
    pub fn resolve(self, width: usize) -> usize {
        let last = width.saturating_sub(1);
        match self {
            ClassPosition::First => 0,
            ClassPosition::Last => last,
            ClassPosition::Column(index) => index.min(last),
        }
    }
}

/// A comma-separated dataset of string samples.
///
/// Each line becomes one sample; fields are trimmed and rows with fewer
/// than two fields are discarded during loading. An element filter can
/// mask out irrelevant columns, and the sample set splits 80/20 into
/// training and test subsets.
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Vec<String>>,
    filter: Vec<bool>,
    n_columns: usize,
}

impl Dataset {
    /// Loads every data sample from a local file.
    pub fn from_path(path: &str) -> io::Result<Dataset> {
        let file = File::open(path)?;
        Dataset::from_reader(BufReader::new(file))
    }

    /// Loads samples from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Dataset> {
        let mut samples = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let fields: Vec<String> = line
                .split(DELIMITER)
                .map(|field| field.trim().to_string())
                .collect();
            if fields.len() > 1 {
                samples.push(fields);
            }
        }
        Dataset::from_rows(samples)
    }

    /// Loads samples from an in-memory string.
    pub fn from_text(text: &str) -> io::Result<Dataset> {
        Dataset::from_reader(io::Cursor::new(text))
    }

    pub fn from_rows(samples: Vec<Vec<String>>) -> io::Result<Dataset> {
        if samples.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "dataset is empty"));
        }
        let n_columns = samples[0].len();
        Ok(Dataset { samples, filter: vec![true; n_columns], n_columns })
    }

    /// Masks out irrelevant columns; the filter length must match the
    /// column count.
    pub fn set_element_filter(&mut self, filter: &[bool]) -> Result<()> {
        if filter.len() != self.n_columns {
            return Err(NetworkError::DimensionMismatch {
                expected: self.n_columns,
                actual: filter.len(),
            });
        }
        self.filter = filter.to_vec();
        Ok(())
    }

    pub fn element_filter(&self) -> &[bool] {
        &self.filter
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.n_columns
    }

    /// All loaded samples with the element filter applied.
    pub fn samples(&self) -> Vec<Vec<String>> {
        self.subset(0, self.samples.len())
    }

    /// The first 80% of the samples.
    pub fn training_samples(&self) -> Vec<Vec<String>> {
        self.subset(0, self.cut_point())
    }

    /// The last 20% of the samples.
    pub fn test_samples(&self) -> Vec<Vec<String>> {
        self.subset(self.cut_point(), self.samples.len())
    }

    fn cut_point(&self) -> usize {
        self.samples.len() * TRAINING_SET_PERCENTAGE / 100
    }

    fn subset(&self, from: usize, to: usize) -> Vec<Vec<String>> {
        self.samples[from..to]
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.filter)
                    .filter(|(_, keep)| **keep)
                    .map(|(value, _)| value.clone())
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
        a, 1, x\n\
        b, 2, y\n\
        malformed-single-field\n\
        c, 3, x\n\
        d, 4, y\n\
        e, 5, x\n";

    #[test]
    fn loads_trimmed_rows_and_discards_short_ones() {
        let dataset = Dataset::from_text(CSV).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.column_count(), 3);
        assert_eq!(dataset.samples()[0], vec!["a", "1", "x"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Dataset::from_text("only-one-field\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn element_filter_masks_columns() {
        let mut dataset = Dataset::from_text(CSV).unwrap();
        assert!(matches!(
            dataset.set_element_filter(&[true, false]),
            Err(NetworkError::DimensionMismatch { expected: 3, actual: 2 })
        ));

        dataset.set_element_filter(&[true, false, true]).unwrap();
        assert_eq!(dataset.samples()[1], vec!["b", "y"]);
    }

    #[test]
    fn split_follows_the_eighty_twenty_rule() {
        let dataset = Dataset::from_text(CSV).unwrap();
        assert_eq!(dataset.training_samples().len(), 4);
        assert_eq!(dataset.test_samples().len(), 1);
        assert_eq!(dataset.test_samples()[0], vec!["e", "5", "x"]);
    }

    #[test]
    fn class_position_resolves_against_row_width() {
        assert_eq!(ClassPosition::First.resolve(5), 0);
        assert_eq!(ClassPosition::Last.resolve(5), 4);
        assert_eq!(ClassPosition::Column(2).resolve(5), 2);
        assert_eq!(ClassPosition::Column(9).resolve(5), 4);
    }
}
