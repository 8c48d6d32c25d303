use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::error::{NetworkError, Result};
use crate::network::{Network, WeightLayout};

use super::Trainer;
use super::gradient::{accumulate_sample, node_delta_buffers};
use super::progress::{ProgressReporter, TrainingStats};

const ETA_PLUS: f64 = 1.2;
const ETA_MINUS: f64 = 0.5;
const DELTA_MAX: f64 = 50.0;
const DELTA_MIN: f64 = 1.0e-6;
const INITIAL_DELTA: f64 = 0.45;

/// Batch trainer using resilient propagation.
///
/// Gradients are accumulated exactly as in backpropagation, but each
/// weight carries its own adaptive step size driven purely by the sign of
/// its gradient across epochs - gradient magnitude never enters the
/// update. A sign flip rolls the previous step back and neutralizes the
/// stored gradient, so the next comparison starts from neutral ground.
///
/// The whole dataset forms one batch unless a smaller batch size is set.
pub struct ResilientPropagation {
    input_data: Vec<Vec<f64>>,
    ideal_data: Vec<Vec<f64>>,
    batch_size: Option<usize>,
    mean_squared_error: f64,
    epoch: usize,
    squared_error_accumulated: f64,
    total_count: usize,
    prev_delta: Vec<f64>,
    prev_gradients: Vec<f64>,
    gradients: Vec<f64>,
    progress: ProgressReporter,
}

impl ResilientPropagation {
    pub fn new(input_data: Vec<Vec<f64>>, ideal_data: Vec<Vec<f64>>) -> ResilientPropagation {
        ResilientPropagation {
            input_data,
            ideal_data,
            batch_size: None,
            mean_squared_error: f64::MAX,
            epoch: 0,
            squared_error_accumulated: 0.0,
            total_count: 0,
            prev_delta: Vec::new(),
            prev_gradients: Vec::new(),
            gradients: Vec::new(),
            progress: ProgressReporter::new(),
        }
    }

    /// Overrides the full-dataset batch with a smaller one.
    pub fn set_batch_size(&mut self, size: usize) {
        self.batch_size = Some(size.max(1));
    }

    pub fn set_progress_callback(
        &mut self,
        interval: Duration,
        callback: impl FnMut(&TrainingStats) + 'static,
    ) {
        self.progress.set_callback(interval, callback);
    }

    /// When the flag turns true, training stops after the current epoch.
    pub fn set_stop_flag(&mut self, flag: Arc<AtomicBool>) {
        self.progress.set_stop_flag(flag);
    }

    fn prepare(&mut self, layout: &WeightLayout) {
        self.prev_delta = vec![INITIAL_DELTA; layout.total()];
        self.prev_gradients = vec![INITIAL_DELTA; layout.total()];
        self.gradients = vec![0.0; layout.total()];
        self.squared_error_accumulated = 0.0;
        self.total_count = 0;
        self.mean_squared_error = f64::MAX;
    }

    fn execute_epoch(
        &mut self,
        network: &mut Network,
        layout: &WeightLayout,
        node_delta: &mut [Vec<f64>],
    ) -> Result<()> {
        let n_samples = self.input_data.len();
        let batch_size = self.batch_size.unwrap_or(n_samples).max(1);

        let mut batch_start = 0;
        while batch_start < n_samples {
            let batch_end = (batch_start + batch_size).min(n_samples);

            for sample_idx in batch_start..batch_end {
                let (squared_error, n_elements) = accumulate_sample(
                    network,
                    layout,
                    &self.input_data[sample_idx],
                    &self.ideal_data[sample_idx],
                    node_delta,
                    &mut self.gradients,
                )?;
                self.squared_error_accumulated += squared_error;
                self.total_count += n_elements;
            }

            self.update_weights(network, layout);
            batch_start = batch_end;
        }
        Ok(())
    }

    /// Applies the sign-comparison update to every weight and clears the
    /// gradient accumulator for the next batch.
    fn update_weights(&mut self, network: &mut Network, layout: &WeightLayout) {
        let last = network.layers.len() - 1;
        for layer_idx in 0..last {
            let layer = &mut network.layers[layer_idx];
            for (neuron_idx, neuron) in layer.neurons.iter_mut().enumerate() {
                for k in 0..neuron.weights.len() {
                    let idx = layout.index(layer_idx, neuron_idx, k);
                    let mut gradient = self.gradients[idx];
                    let product = gradient * self.prev_gradients[idx];

                    let delta = if product > 0.0 {
                        // Consistent direction: accelerate.
                        let delta = (self.prev_delta[idx] * ETA_PLUS).min(DELTA_MAX);
                        neuron.weights[k] += sign(gradient) * delta;
                        delta
                    } else if product < 0.0 {
                        // Overshoot: undo the previous step and neutralize
                        // the gradient for the next comparison.
                        neuron.weights[k] -= self.prev_delta[idx];
                        gradient = 0.0;
                        (self.prev_delta[idx] * ETA_MINUS).max(DELTA_MIN)
                    } else {
                        let delta = self.prev_delta[idx];
                        neuron.weights[k] += sign(gradient) * delta;
                        delta
                    };

                    self.prev_delta[idx] = delta;
                    self.prev_gradients[idx] = gradient;
                    self.gradients[idx] = 0.0;
                }
            }
        }
    }

    fn calculate_error(&mut self) {
        self.mean_squared_error = self.squared_error_accumulated / self.total_count as f64;
        self.squared_error_accumulated = 0.0;
        self.total_count = 0;
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

impl Trainer for ResilientPropagation {
    fn train(
        &mut self,
        network: &mut Network,
        accepted_error: f64,
        max_epochs: usize,
    ) -> Result<f64> {
        if !network.is_ready() {
            return Err(NetworkError::NotReady);
        }
        if self.input_data.len() != self.ideal_data.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.input_data.len(),
                actual: self.ideal_data.len(),
            });
        }
        if self.input_data.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        let layout = WeightLayout::of(network);
        let mut node_delta = node_delta_buffers(network);
        self.prepare(&layout);
        network.reset()?;

        self.epoch = 0;
        while self.epoch < max_epochs && self.mean_squared_error > accepted_error {
            self.execute_epoch(network, &layout, &mut node_delta)?;
            self.calculate_error();
            self.progress.report(self.epoch, self.mean_squared_error);
            self.epoch += 1;

            if self.progress.should_stop() {
                break;
            }
        }
        Ok(self.mean_squared_error)
    }

    fn mean_squared_error(&self) -> f64 {
        self.mean_squared_error
    }

    fn epochs_run(&self) -> usize {
        self.epoch
    }

    fn summary(&self) -> String {
        let batch = match self.batch_size {
            Some(size) => size.to_string(),
            None => format!("{} (full dataset)", self.input_data.len()),
        };
        format!(
            "------------- Training Results -------------\n\
             Training samples: {}\n\
             Batch size: {batch}\n\
             Epochs: {}\n\
             Mean squared error: {:.12}",
            self.input_data.len(),
            self.epoch,
            self.mean_squared_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use approx::assert_relative_eq;

    fn built_1_1() -> Network {
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();
        network
    }

    fn prepared_trainer(network: &Network) -> (ResilientPropagation, WeightLayout) {
        let mut trainer = ResilientPropagation::new(vec![vec![0.0]], vec![vec![0.0]]);
        let layout = WeightLayout::of(network);
        trainer.prepare(&layout);
        (trainer, layout)
    }

    #[test]
    fn consistent_gradient_sign_grows_the_step() {
        let mut network = built_1_1();
        network.load_weights(&[0.0, 0.0]).unwrap();
        let (mut trainer, layout) = prepared_trainer(&network);

        // Initial previous gradient is positive, so a positive gradient
        // accelerates: step = 0.45 * 1.2.
        trainer.gradients[0] = 2.0;
        trainer.gradients[1] = 2.0;
        trainer.update_weights(&mut network, &layout);

        assert_relative_eq!(trainer.prev_delta[0], INITIAL_DELTA * ETA_PLUS);
        assert_relative_eq!(network.layers[0].neurons[0].weights[0], INITIAL_DELTA * ETA_PLUS);
        assert_relative_eq!(trainer.prev_gradients[0], 2.0);
        assert_relative_eq!(trainer.gradients[0], 0.0);
    }

    #[test]
    fn step_growth_is_capped() {
        let mut network = built_1_1();
        network.load_weights(&[0.0, 0.0]).unwrap();
        let (mut trainer, layout) = prepared_trainer(&network);

        trainer.prev_delta[0] = 49.0;
        trainer.gradients[0] = 1.0;
        trainer.update_weights(&mut network, &layout);

        assert_relative_eq!(trainer.prev_delta[0], DELTA_MAX);
        assert_relative_eq!(network.layers[0].neurons[0].weights[0], DELTA_MAX);
    }

    #[test]
    fn sign_flip_rolls_back_and_neutralizes_the_gradient() {
        let mut network = built_1_1();
        network.load_weights(&[1.0, 0.0]).unwrap();
        let (mut trainer, layout) = prepared_trainer(&network);

        trainer.prev_delta[0] = 0.6;
        trainer.prev_gradients[0] = 1.0;
        trainer.gradients[0] = -3.0;
        trainer.update_weights(&mut network, &layout);

        // The previous step is undone, not a new one applied.
        assert_relative_eq!(network.layers[0].neurons[0].weights[0], 1.0 - 0.6);
        assert_relative_eq!(trainer.prev_delta[0], 0.6 * ETA_MINUS);
        // Stored gradient is zeroed so the next epoch sees a neutral sign.
        assert_relative_eq!(trainer.prev_gradients[0], 0.0);
    }

    #[test]
    fn step_shrink_is_floored() {
        let mut network = built_1_1();
        network.load_weights(&[0.0, 0.0]).unwrap();
        let (mut trainer, layout) = prepared_trainer(&network);

        trainer.prev_delta[0] = DELTA_MIN;
        trainer.prev_gradients[0] = 1.0;
        trainer.gradients[0] = -1.0;
        trainer.update_weights(&mut network, &layout);

        assert_relative_eq!(trainer.prev_delta[0], DELTA_MIN);
    }

    #[test]
    fn zero_product_keeps_the_step_and_moves_by_gradient_sign() {
        let mut network = built_1_1();
        network.load_weights(&[0.0, 0.0]).unwrap();
        let (mut trainer, layout) = prepared_trainer(&network);

        trainer.prev_delta[0] = 0.3;
        trainer.prev_gradients[0] = 0.0;
        trainer.gradients[0] = -1.0;
        trainer.update_weights(&mut network, &layout);

        assert_relative_eq!(trainer.prev_delta[0], 0.3);
        assert_relative_eq!(network.layers[0].neurons[0].weights[0], -0.3);
        assert_relative_eq!(trainer.prev_gradients[0], -1.0);
    }

    #[test]
    fn step_sizes_stay_bounded_during_training() {
        let inputs = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ];
        let ideals = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];

        let mut network = Network::new();
        network.add_layer(2, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(3, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();

        let mut trainer = ResilientPropagation::new(inputs, ideals);
        trainer.train(&mut network, 0.0, 250).unwrap();

        for delta in &trainer.prev_delta {
            assert!((DELTA_MIN..=DELTA_MAX).contains(delta), "step size {delta} out of bounds");
        }
    }
}
