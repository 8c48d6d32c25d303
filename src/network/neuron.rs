use serde::{Serialize, Deserialize};

/// Core data of a single unit: the outgoing weight vector plus the scratch
/// scalars recomputed on every forward pass.
///
/// `sum` and `output` are overwritten by each `Network::compute` call and
/// are never persisted; trainers read them immediately after the forward
/// pass for the sample they just fed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    /// One weight per normal neuron in the next layer.
    pub weights: Vec<f64>,
    /// Post-activation output of the latest forward pass.
    #[serde(skip)]
    pub output: f64,
    /// Pre-activation weighted sum of the latest forward pass.
    #[serde(skip)]
    pub sum: f64,
}

impl Neuron {
    pub fn new(n_weights: usize) -> Neuron {
        Neuron::with_output(n_weights, 0.0)
    }

    /// Bias neurons are constructed with a fixed initial output of 1.0.
    pub fn with_output(n_weights: usize, initial_output: f64) -> Neuron {
        Neuron {
            weights: vec![0.0; n_weights],
            output: initial_output,
            sum: 0.0,
        }
    }

    /// Re-derives the scratch state after deserialization.
    pub(crate) fn restore_scratch(&mut self, initial_output: f64) {
        self.output = initial_output;
        self.sum = 0.0;
    }
}
