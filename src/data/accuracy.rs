use crate::error::{NetworkError, Result};
use crate::network::Network;

use super::dataset::ClassPosition;
use super::normalizer::ClassificationNormalizer;

/// Measures the classification accuracy of a trained network against a
/// string test set.
///
/// The test set goes through the same scan-and-normalize rules as
/// training data; each sample is computed through the network and counts
/// as a hit when the argmax output lands on the labelled class.
#[derive(Debug)]
pub struct AccuracyTester {
    testset: Vec<Vec<String>>,
    class_position: ClassPosition,
}

impl AccuracyTester {
    pub fn new(testset: Vec<Vec<String>>, class_position: ClassPosition) -> Result<AccuracyTester> {
        if testset.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }
        Ok(AccuracyTester { testset, class_position })
    }

    /// Returns the hit percentage over the whole test set.
    pub fn classification_accuracy(&self, network: &mut Network) -> Result<f64> {
        if !network.is_ready() {
            return Err(NetworkError::NotReady);
        }

        let mut normalizer = ClassificationNormalizer::new();
        normalizer.add_dataset(&self.testset, self.class_position)?;
        let class_position = self.class_position.resolve(self.testset[0].len());

        let mut hits = 0usize;
        for sample in &self.testset {
            let correct_class = &sample[class_position];
            let attributes: Vec<&str> = sample
                .iter()
                .enumerate()
                .filter(|(column, _)| *column != class_position)
                .map(|(_, value)| value.as_str())
                .collect();

            let inputs = normalizer.normalize_attributes(&attributes)?;
            let outputs = network.compute(&inputs)?;
            if normalizer.best_class_match(&outputs)? == correct_class {
                hits += 1;
            }
        }

        Ok(hits as f64 / self.testset.len() as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use approx::assert_relative_eq;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect()
    }

    /// 1-2 network whose output pair is separable by hand-picked weights:
    /// input 0.0 fires class 0, input 0.5 fires class 1.
    fn hand_weighted_classifier() -> Network {
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(2, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();
        network.layers[0].neurons[0].weights = vec![-10.0, 10.0];
        network.layers[0].neurons[1].weights = vec![1.0, -1.0];
        network
    }

    #[test]
    fn perfect_classifier_scores_100_percent() {
        let testset = rows(&[&["a", "x"], &["b", "y"], &["a", "x"], &["b", "y"]]);
        let mut network = hand_weighted_classifier();
        let tester = AccuracyTester::new(testset, ClassPosition::Last).unwrap();
        let accuracy = tester.classification_accuracy(&mut network).unwrap();
        assert_relative_eq!(accuracy, 100.0);
    }

    #[test]
    fn unready_networks_are_rejected() {
        let testset = rows(&[&["a", "x"]]);
        let tester = AccuracyTester::new(testset, ClassPosition::Last).unwrap();
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        let err = tester.classification_accuracy(&mut network).unwrap_err();
        assert_eq!(err, NetworkError::NotReady);
    }

    #[test]
    fn empty_test_sets_are_rejected() {
        let err = AccuracyTester::new(Vec::new(), ClassPosition::Last).unwrap_err();
        assert_eq!(err, NetworkError::EmptyDataset);
    }
}
