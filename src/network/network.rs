use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};

use super::layer::Layer;

const BIAS_NEURONS: usize = 1;
const WEIGHT_INIT_RANGE: f64 = 2.0;

/// A feed-forward network: an ordered chain of fully connected layers.
///
/// Layers are declared with [`Network::add_layer`] and materialized by
/// [`Network::build`]; until then the network is not ready and
/// `compute`/`reset` fail with [`NetworkError::NotReady`]. After `build()`
/// the topology is fixed - trainers only ever mutate weight values.
///
/// Per-neuron `sum`/`output` fields are scratch state overwritten by every
/// forward pass, so a single instance must not be shared between
/// concurrent callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(skip)]
    pending: Vec<(usize, ActivationFunction)>,
    #[serde(skip)]
    ready: bool,
}

impl Network {
    pub fn new() -> Network {
        Network { layers: Vec::new(), pending: Vec::new(), ready: false }
    }

    /// Queues a layer for the next `build()`.
    pub fn add_layer(&mut self, size: usize, activation: ActivationFunction) -> Result<()> {
        if size == 0 {
            return Err(NetworkError::InvalidTopology(
                "each layer needs at least one neuron".into(),
            ));
        }
        self.pending.push((size, activation));
        Ok(())
    }

    /// Materializes the declared layers.
    ///
    /// Every non-terminal layer gets one bias neuron and per-neuron weight
    /// vectors sized to the next layer's normal neuron count; the terminal
    /// layer gets neither weights nor a bias neuron.
    pub fn build(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Err(NetworkError::InvalidTopology(
                "no layers have been added to the network".into(),
            ));
        }

        self.layers = Vec::with_capacity(self.pending.len());
        for index in 0..self.pending.len() {
            let (size, activation) = self.pending[index];
            match self.pending.get(index + 1) {
                Some(&(next_size, _)) => {
                    self.layers.push(Layer::new(activation, size, next_size, BIAS_NEURONS));
                }
                None => {
                    self.layers.push(Layer::new(activation, size, 0, 0));
                }
            }
        }
        self.pending.clear();
        self.ready = true;
        Ok(())
    }

    /// Assigns every weight an independent value drawn uniformly from
    /// [-2, 2], the fixed symmetric initialization range this engine uses.
    pub fn reset(&mut self) -> Result<()> {
        if !self.ready {
            return Err(NetworkError::NotReady);
        }
        let mut rng = rand::thread_rng();
        for layer in &mut self.layers {
            for neuron in &mut layer.neurons {
                for weight in &mut neuron.weights {
                    *weight = WEIGHT_INIT_RANGE * 2.0 * rng.gen::<f64>() - WEIGHT_INIT_RANGE;
                }
            }
        }
        Ok(())
    }

    /// Feeds the input through the network and returns the output layer's
    /// outputs.
    ///
    /// The input layer's outputs are set directly (no activation applied);
    /// each subsequent normal neuron sums `prev.output * prev.weight` over
    /// every neuron of the previous layer, bias included, and activates
    /// the result. Deterministic for fixed weights.
    pub fn compute(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if !self.ready {
            return Err(NetworkError::NotReady);
        }

        match self.layers.first_mut() {
            Some(input_layer) => input_layer.set_outputs(input)?,
            None => return Err(NetworkError::NotReady),
        }

        for layer_idx in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(layer_idx);
            let last_layer = &before[layer_idx - 1];
            let this_layer = &mut after[0];
            let activation = this_layer.activation;

            for neuron_idx in 0..this_layer.normal_count() {
                let mut sum = 0.0;
                for last_neuron in &last_layer.neurons {
                    sum += last_neuron.output * last_neuron.weights[neuron_idx];
                }
                let neuron = &mut this_layer.neurons[neuron_idx];
                neuron.sum = sum;
                neuron.output = activation.function(sum);
            }
        }

        match self.layers.last() {
            Some(output_layer) => Ok(output_layer.outputs()),
            None => Err(NetworkError::NotReady),
        }
    }

    /// The network is ready once `build()` has materialized its layers.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// All weights in canonical order: layer-major, then neuron-major
    /// (bias included), then by weight index.
    pub fn flattened_weights(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.weight_count());
        for layer in &self.layers {
            for neuron in &layer.neurons {
                flat.extend_from_slice(&neuron.weights);
            }
        }
        flat
    }

    /// Loads a flattened weight vector back in canonical order.
    pub fn load_weights(&mut self, weights: &[f64]) -> Result<()> {
        let expected = self.weight_count();
        if weights.len() != expected {
            return Err(NetworkError::DimensionMismatch { expected, actual: weights.len() });
        }
        let mut index = 0;
        for layer in &mut self.layers {
            for neuron in &mut layer.neurons {
                for weight in &mut neuron.weights {
                    *weight = weights[index];
                    index += 1;
                }
            }
        }
        Ok(())
    }

    pub fn weight_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| {
                layer.neurons.iter().map(|neuron| neuron.weights.len()).sum::<usize>()
            })
            .sum()
    }

    /// Serializes the full layer/neuron/weight structure to a
    /// pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json`.
    ///
    /// The imported layer chain is validated before the network is marked
    /// ready; files whose layers do not line up are rejected rather than
    /// patched up with defaults.
    pub fn load_json(path: &str) -> std::io::Result<Network> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut network: Network = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        network
            .finish_import()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(network)
    }

    fn finish_import(&mut self) -> Result<()> {
        self.validate_structure()?;
        for layer in &mut self.layers {
            layer.restore_scratch();
        }
        self.ready = true;
        Ok(())
    }

    fn validate_structure(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(NetworkError::MalformedModel("model contains no layers".into()));
        }

        // Bias placement first, so normal neuron counts are well defined
        // before the weight widths are checked against them.
        for (index, layer) in self.layers.iter().enumerate() {
            let terminal = index + 1 == self.layers.len();

            if layer.neurons.is_empty() || layer.bias_count() >= layer.neurons.len() {
                return Err(NetworkError::MalformedModel(format!(
                    "layer {index} has no normal neurons"
                )));
            }
            if terminal && layer.bias_count() != 0 {
                return Err(NetworkError::MalformedModel(
                    "output layer must not carry bias neurons".into(),
                ));
            }
            if !terminal && layer.bias_count() != BIAS_NEURONS {
                return Err(NetworkError::MalformedModel(format!(
                    "layer {index} must carry exactly {BIAS_NEURONS} bias neuron"
                )));
            }
        }

        for (index, layer) in self.layers.iter().enumerate() {
            let terminal = index + 1 == self.layers.len();
            let expected = if terminal { 0 } else { self.layers[index + 1].normal_count() };
            for (neuron_idx, neuron) in layer.neurons.iter().enumerate() {
                if neuron.weights.len() != expected {
                    return Err(NetworkError::MalformedModel(format!(
                        "layer {index} neuron {neuron_idx}: expected {expected} weights, \
                         found {}",
                        neuron.weights.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (layer_idx, layer) in self.layers.iter().enumerate() {
            writeln!(f, "Layer_{layer_idx}")?;
            for (neuron_idx, neuron) in layer.neurons.iter().enumerate() {
                writeln!(f, "  Neuron_{neuron_idx} - output: {}", neuron.output)?;
                for (weight_idx, weight) in neuron.weights.iter().enumerate() {
                    writeln!(f, "    Weight_{weight_idx} = {weight}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn built_2_2_1() -> Network {
        let mut network = Network::new();
        network.add_layer(2, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(2, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();
        network
    }

    #[test]
    fn add_layer_rejects_empty_layers() {
        let mut network = Network::new();
        let err = network.add_layer(0, ActivationFunction::Sigmoid).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidTopology(_)));
    }

    #[test]
    fn build_requires_declared_layers() {
        let mut network = Network::new();
        let err = network.build().unwrap_err();
        assert!(matches!(err, NetworkError::InvalidTopology(_)));
    }

    #[test]
    fn compute_and_reset_require_build() {
        let mut network = Network::new();
        network.add_layer(2, ActivationFunction::Sigmoid).unwrap();
        assert_eq!(network.compute(&[0.0, 0.0]).unwrap_err(), NetworkError::NotReady);
        assert_eq!(network.reset().unwrap_err(), NetworkError::NotReady);
        assert!(!network.is_ready());
    }

    #[test]
    fn build_shapes_layers_and_bias_units() {
        let network = built_2_2_1();
        assert!(network.is_ready());
        assert_eq!(network.layers.len(), 3);
        assert_eq!(network.layers[0].neurons.len(), 3);
        assert_eq!(network.layers[0].bias_count(), 1);
        assert_eq!(network.layers[1].neurons.len(), 3);
        assert_eq!(network.layers[2].neurons.len(), 1);
        assert_eq!(network.layers[2].bias_count(), 0);
        assert!(network.layers[2].neurons[0].weights.is_empty());
        assert_eq!(network.weight_count(), 9);
    }

    #[test]
    fn compute_rejects_wrong_input_width() {
        let mut network = built_2_2_1();
        let err = network.compute(&[1.0]).unwrap_err();
        assert_eq!(err, NetworkError::DimensionMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn compute_output_width_matches_output_layer() {
        let mut network = built_2_2_1();
        network.reset().unwrap();
        let output = network.compute(&[0.25, 0.75]).unwrap();
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn compute_is_deterministic_for_fixed_weights() {
        let mut network = built_2_2_1();
        network.reset().unwrap();
        let first = network.compute(&[0.1, 0.9]).unwrap();
        let second = network.compute(&[0.1, 0.9]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compute_applies_bias_and_activation() {
        // 1-1 network: output sum = input * w + 1.0 * w_bias.
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();
        network.layers[0].neurons[0].weights[0] = 0.5;
        network.layers[0].neurons[1].weights[0] = -0.25;

        let output = network.compute(&[1.0]).unwrap();
        let expected_sum: f64 = 1.0 * 0.5 + 1.0 * -0.25;
        let expected = 1.0 / (1.0 + (-expected_sum).exp());
        assert_relative_eq!(output[0], expected, epsilon = 1e-12);
        assert_relative_eq!(network.layers[1].neurons[0].sum, expected_sum);
    }

    #[test]
    fn flattened_weights_round_trip() {
        let mut network = built_2_2_1();
        network.reset().unwrap();
        let flat = network.flattened_weights();
        assert_eq!(flat.len(), 9);

        let mut other = built_2_2_1();
        other.load_weights(&flat).unwrap();
        assert_eq!(other.flattened_weights(), flat);

        let err = other.load_weights(&flat[..5]).unwrap_err();
        assert_eq!(err, NetworkError::DimensionMismatch { expected: 9, actual: 5 });
    }

    #[test]
    fn save_and_load_preserve_weights() {
        let mut network = built_2_2_1();
        network.reset().unwrap();
        let path = std::env::temp_dir().join("axon_nn_roundtrip.json");
        let path = path.to_string_lossy().into_owned();

        network.save_json(&path).unwrap();
        let mut restored = Network::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(restored.is_ready());
        assert_eq!(restored.flattened_weights(), network.flattened_weights());
        // Bias outputs were re-derived; the forward pass must agree.
        let input = [0.4, 0.6];
        assert_eq!(
            restored.compute(&input).unwrap(),
            network.compute(&input).unwrap()
        );
    }

    #[test]
    fn load_rejects_malformed_layer_chains() {
        // A single layer that still claims outgoing weights.
        let json = r#"{"layers":[{"neurons":[{"weights":[0.1]}],"n_bias":0,"activation":"Sigmoid"}]}"#;
        let path = std::env::temp_dir().join("axon_nn_malformed.json");
        std::fs::write(&path, json).unwrap();
        let err = Network::load_json(&path.to_string_lossy()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
