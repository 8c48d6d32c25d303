use super::network::Network;

/// Offset map over a built network's weight storage.
///
/// Weights are ordered layer-major, then neuron-major (bias neurons
/// included), then by weight index. This single ordering is shared by the
/// trainers' flat scratch buffers and by the genetic flatten/reconstitute
/// cycle, so DNA positions and trainer state always agree.
#[derive(Debug, Clone)]
pub struct WeightLayout {
    layers: Vec<LayerSlot>,
    total: usize,
}

#[derive(Debug, Clone, Copy)]
struct LayerSlot {
    offset: usize,
    weights_per_neuron: usize,
}

impl WeightLayout {
    pub fn of(network: &Network) -> WeightLayout {
        let mut layers = Vec::with_capacity(network.layers.len());
        let mut total = 0;
        for layer in &network.layers {
            let weights_per_neuron =
                layer.neurons.first().map_or(0, |neuron| neuron.weights.len());
            layers.push(LayerSlot { offset: total, weights_per_neuron });
            total += layer.neurons.len() * weights_per_neuron;
        }
        WeightLayout { layers, total }
    }

    /// Total number of weights across all layers.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Flat position of one weight.
    pub fn index(&self, layer: usize, neuron: usize, weight: usize) -> usize {
        let slot = self.layers[layer];
        slot.offset + neuron * slot.weights_per_neuron + weight
    }
}
