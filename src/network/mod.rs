pub mod layer;
pub mod layout;
pub mod network;
pub mod neuron;

pub use layer::Layer;
pub use layout::WeightLayout;
pub use network::Network;
pub use neuron::Neuron;
