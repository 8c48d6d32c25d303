use crate::error::Result;
use crate::network::{Network, WeightLayout};

/// One node-delta slot per neuron, per layer (bias neurons included).
pub(crate) fn node_delta_buffers(network: &Network) -> Vec<Vec<f64>> {
    network
        .layers
        .iter()
        .map(|layer| vec![0.0; layer.neurons.len()])
        .collect()
}

/// Runs one forward/backward pass for a single sample.
///
/// Node deltas land in `node_delta`; per-weight gradients are accumulated
/// into the flat `gradients` buffer through `layout`. Returns the sample's
/// summed squared error and the number of output units that contributed.
///
/// The output layer's node-delta is `-(actual - ideal) * f'(sum)`, so the
/// eventual weight update is additive. Hidden deltas fold each neuron's
/// outgoing weights against the next layer's deltas, and the gradient for
/// weight `k` of a neuron is that next delta scaled by the neuron's own
/// output.
pub(crate) fn accumulate_sample(
    network: &mut Network,
    layout: &WeightLayout,
    input: &[f64],
    ideal: &[f64],
    node_delta: &mut [Vec<f64>],
    gradients: &mut [f64],
) -> Result<(f64, usize)> {
    let actual = network.compute(input)?;
    let last = network.layers.len() - 1;
    let out_activation = network.layers[last].activation;

    let n_elements = actual.len().min(ideal.len());
    let mut squared_error = 0.0;
    for i in 0..n_elements {
        let delta_error = actual[i] - ideal[i];
        squared_error += delta_error * delta_error;
        let sum = network.layers[last].neurons[i].sum;
        node_delta[last][i] = -delta_error * out_activation.derivative(sum);
    }

    for layer_idx in (0..last).rev() {
        let (head, tail) = node_delta.split_at_mut(layer_idx + 1);
        let this_delta = &mut head[layer_idx];
        let next_delta = &tail[0];

        let layer = &network.layers[layer_idx];
        let activation = layer.activation;

        for (neuron_idx, neuron) in layer.neurons.iter().enumerate() {
            let mut weight_sum = 0.0;
            for k in 0..neuron.weights.len() {
                weight_sum += neuron.weights[k] * next_delta[k];
            }
            this_delta[neuron_idx] = weight_sum * activation.derivative(neuron.sum);

            for k in 0..neuron.weights.len() {
                gradients[layout.index(layer_idx, neuron_idx, k)] +=
                    next_delta[k] * neuron.output;
            }
        }
    }

    Ok((squared_error, n_elements))
}
