pub mod activation;
pub mod data;
pub mod error;
pub mod network;
pub mod training;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use data::{AccuracyTester, ClassPosition, ClassificationNormalizer, Dataset};
pub use error::{NetworkError, Result};
pub use network::{Layer, Network, Neuron, WeightLayout};
pub use training::{breed, Backpropagation, ResilientPropagation, Trainer, TrainingStats};
