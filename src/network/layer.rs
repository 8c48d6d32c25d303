use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NetworkError, Result};

use super::neuron::Neuron;

/// An ordered group of neurons sharing one activation function.
///
/// Non-terminal layers carry one bias neuron after their normal neurons.
/// Bias neurons hold a constant output of 1.0 and supply the additive
/// offset to the next layer's weighted sums; the output layer never has
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub neurons: Vec<Neuron>,
    n_bias: usize,
    pub activation: ActivationFunction,
}

impl Layer {
    pub(crate) fn new(
        activation: ActivationFunction,
        n_neurons: usize,
        n_weights_per_neuron: usize,
        n_bias: usize,
    ) -> Layer {
        let mut neurons = Vec::with_capacity(n_neurons + n_bias);
        for _ in 0..n_neurons {
            neurons.push(Neuron::new(n_weights_per_neuron));
        }
        for _ in 0..n_bias {
            neurons.push(Neuron::with_output(n_weights_per_neuron, 1.0));
        }
        Layer { neurons, n_bias, activation }
    }

    /// Sets the outputs of the normal neurons directly, leaving any bias
    /// neuron at its constant 1.0.
    pub fn set_outputs(&mut self, data: &[f64]) -> Result<()> {
        let expected = self.normal_count();
        if data.len() != expected {
            return Err(NetworkError::DimensionMismatch { expected, actual: data.len() });
        }
        for (neuron, value) in self.neurons.iter_mut().zip(data) {
            neuron.output = *value;
        }
        Ok(())
    }

    /// Outputs of the normal neurons, in order.
    pub fn outputs(&self) -> Vec<f64> {
        self.neurons[..self.normal_count()]
            .iter()
            .map(|neuron| neuron.output)
            .collect()
    }

    /// Number of neurons excluding bias units.
    pub fn normal_count(&self) -> usize {
        self.neurons.len() - self.n_bias
    }

    pub fn bias_count(&self) -> usize {
        self.n_bias
    }

    /// Zeroes the scratch state and restores bias outputs after
    /// deserialization.
    pub(crate) fn restore_scratch(&mut self) {
        let normal = self.neurons.len() - self.n_bias;
        for (index, neuron) in self.neurons.iter_mut().enumerate() {
            let initial = if index < normal { 0.0 } else { 1.0 };
            neuron.restore_scratch(initial);
        }
    }
}
