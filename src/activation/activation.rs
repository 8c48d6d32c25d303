use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Per-layer activation function applied to each neuron's weighted sum.
///
/// Both trainers evaluate `derivative()` on the pre-activation sum, so the
/// derivatives here are written as functions of the raw input, not of the
/// already-activated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    /// `1 / (1 + e^-x)`, output range (0, 1).
    Sigmoid,
    /// `tanh(x)`, output range (-1, 1).
    HyperbolicTangent,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::HyperbolicTangent => x.tanh(),
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::HyperbolicTangent => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}
