use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::error::{NetworkError, Result};
use crate::network::{Network, WeightLayout};

use super::Trainer;
use super::gradient::{accumulate_sample, node_delta_buffers};
use super::progress::{ProgressReporter, TrainingStats};

const MAX_ATTEMPTS: usize = 10;

/// Online gradient-descent trainer with momentum and learning-rate decay.
///
/// Weights are adjusted after every sample by default; a larger mini-batch
/// size defers the update to batch boundaries. If a full epoch budget runs
/// out above the accepted error, the network is re-randomized and training
/// restarts, up to a fixed attempt cap.
pub struct Backpropagation {
    input_data: Vec<Vec<f64>>,
    ideal_data: Vec<Vec<f64>>,
    learning_rate: f64,
    momentum: f64,
    decay_rate: f64,
    batch_size: usize,
    mean_squared_error: f64,
    epoch: usize,
    resets: usize,
    progress: ProgressReporter,
}

impl Backpropagation {
    /// Rows of `input_data` and `ideal_data` pair up one-to-one as
    /// training samples. A lower learning rate slows training but damps
    /// oscillation; momentum helps escape local minima at the cost of
    /// possible overshoot.
    pub fn new(
        input_data: Vec<Vec<f64>>,
        ideal_data: Vec<Vec<f64>>,
        learning_rate: f64,
        momentum: f64,
    ) -> Backpropagation {
        Backpropagation::with_decay(input_data, ideal_data, learning_rate, momentum, 0.0)
    }

    /// Adds a decay rate: the effective rate per epoch is
    /// `learning_rate / (1 + decay_rate * epoch)`.
    pub fn with_decay(
        input_data: Vec<Vec<f64>>,
        ideal_data: Vec<Vec<f64>>,
        learning_rate: f64,
        momentum: f64,
        decay_rate: f64,
    ) -> Backpropagation {
        Backpropagation {
            input_data,
            ideal_data,
            learning_rate,
            momentum,
            decay_rate,
            batch_size: 1,
            mean_squared_error: f64::MAX,
            epoch: 0,
            resets: 0,
            progress: ProgressReporter::new(),
        }
    }

    /// Number of samples to accumulate gradients over before the weights
    /// change. The default of 1 is fully online.
    pub fn set_batch_size(&mut self, size: usize) {
        self.batch_size = size.max(1);
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

    /// Weight re-randomizations performed after the first attempt.
    pub fn resets(&self) -> usize {
        self.resets
    }

    fn execute_epoch(
        &self,
        network: &mut Network,
        layout: &WeightLayout,
        node_delta: &mut [Vec<f64>],
        gradients: &mut [f64],
        prev_weight_change: &mut [f64],
        alpha: f64,
    ) -> Result<f64> {
        let n_samples = self.input_data.len();
        let mut squared_error_accumulated = 0.0;
        let mut total_count = 0usize;

        for sample_idx in 0..n_samples {
            let update_weights =
                sample_idx % self.batch_size == 0 || sample_idx == n_samples - 1;

            let (squared_error, n_elements) = accumulate_sample(
                network,
                layout,
                &self.input_data[sample_idx],
                &self.ideal_data[sample_idx],
                node_delta,
                gradients,
            )?;
            squared_error_accumulated += squared_error;
            total_count += n_elements;

            if update_weights {
                apply_weight_updates(
                    network,
                    layout,
                    gradients,
                    prev_weight_change,
                    alpha,
                    self.momentum,
                );
            }
        }

        Ok(squared_error_accumulated / total_count as f64)
    }
}

/// Consumes the accumulated gradients:
/// `Δw = alpha * gradient + momentum * prevΔw`, applied additively.
fn apply_weight_updates(
    network: &mut Network,
    layout: &WeightLayout,
    gradients: &mut [f64],
    prev_weight_change: &mut [f64],
    alpha: f64,
    momentum: f64,
) {
    let last = network.layers.len() - 1;
    for layer_idx in 0..last {
        let layer = &mut network.layers[layer_idx];
        for (neuron_idx, neuron) in layer.neurons.iter_mut().enumerate() {
            for k in 0..neuron.weights.len() {
                let idx = layout.index(layer_idx, neuron_idx, k);
                let delta_weight = alpha * gradients[idx] + momentum * prev_weight_change[idx];
                prev_weight_change[idx] = delta_weight;
                neuron.weights[k] += delta_weight;
                gradients[idx] = 0.0;
            }
        }
    }
}

impl Trainer for Backpropagation {
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
        let mut gradients = vec![0.0; layout.total()];
        let mut prev_weight_change = vec![0.0; layout.total()];

        let mut attempts = 0;
        loop {
            attempts += 1;
            network.reset()?;
            gradients.fill(0.0);
            prev_weight_change.fill(0.0);
            self.mean_squared_error = f64::MAX;
            self.epoch = 0;

            while self.epoch < max_epochs && self.mean_squared_error > accepted_error {
                let alpha = self.learning_rate / (1.0 + self.decay_rate * self.epoch as f64);
                self.mean_squared_error = self.execute_epoch(
                    network,
                    &layout,
                    &mut node_delta,
                    &mut gradients,
                    &mut prev_weight_change,
                    alpha,
                )?;
                self.progress.report(self.epoch, self.mean_squared_error);
                self.epoch += 1;

                if self.progress.should_stop() {
                    self.resets = attempts - 1;
                    return Ok(self.mean_squared_error);
                }
            }

            if self.mean_squared_error <= accepted_error || attempts >= MAX_ATTEMPTS {
                self.resets = attempts - 1;
                return Ok(self.mean_squared_error);
            }
        }
    }

    fn mean_squared_error(&self) -> f64 {
        self.mean_squared_error
    }

    fn epochs_run(&self) -> usize {
        self.epoch
    }

    fn summary(&self) -> String {
        let batch = if self.batch_size == 1 {
            "1 (stochastic)".to_string()
        } else {
            self.batch_size.to_string()
        };
        format!(
            "------------- Training Results -------------\n\
             Training samples: {}\n\
             Mini-batch size: {batch}\n\
             Learning rate: {}\n\
             Decay rate: {}\n\
             Momentum: {}\n\
             Resets: {}\n\
             Epochs: {}\n\
             Mean squared error: {:.12}",
            self.input_data.len(),
            self.learning_rate,
            self.decay_rate,
            self.momentum,
            self.resets,
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
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::Ordering;

    fn built_1_1() -> Network {
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        network.build().unwrap();
        network
    }

    #[test]
    fn single_sample_step_matches_hand_computed_update() {
        let mut network = built_1_1();
        network.layers[0].neurons[0].weights[0] = 0.5;
        network.layers[0].neurons[1].weights[0] = -0.25;

        let trainer = Backpropagation::new(vec![vec![1.0]], vec![vec![1.0]], 0.5, 0.0);
        let layout = WeightLayout::of(&network);
        let mut node_delta = node_delta_buffers(&network);
        let mut gradients = vec![0.0; layout.total()];
        let mut prev_weight_change = vec![0.0; layout.total()];

        let mse = trainer
            .execute_epoch(
                &mut network,
                &layout,
                &mut node_delta,
                &mut gradients,
                &mut prev_weight_change,
                0.5,
            )
            .unwrap();

        // Forward: sum = 1.0 * 0.5 + 1.0 * -0.25, out = sigmoid(sum).
        let s = 1.0 / (1.0 + (-0.25f64).exp());
        let delta = -(s - 1.0) * s * (1.0 - s);
        // Both the input neuron (output 1.0) and the bias neuron (output
        // 1.0) receive gradient = delta, so both weights move by 0.5 * delta.
        assert_relative_eq!(
            network.layers[0].neurons[0].weights[0],
            0.5 + 0.5 * delta,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            network.layers[0].neurons[1].weights[0],
            -0.25 + 0.5 * delta,
            epsilon = 1e-12
        );
        assert_relative_eq!(mse, (s - 1.0) * (s - 1.0), epsilon = 1e-12);
        // Online update: the weight change is remembered for momentum.
        assert_relative_eq!(prev_weight_change[0], 0.5 * delta, epsilon = 1e-12);
        assert_relative_eq!(gradients[0], 0.0);
    }

    #[test]
    fn train_requires_a_built_network() {
        let mut network = Network::new();
        network.add_layer(1, ActivationFunction::Sigmoid).unwrap();
        let mut trainer = Backpropagation::new(vec![vec![0.0]], vec![vec![0.0]], 0.5, 0.0);
        let err = trainer.train(&mut network, 0.01, 10).unwrap_err();
        assert_eq!(err, NetworkError::NotReady);
    }

    #[test]
    fn train_rejects_mismatched_sample_counts() {
        let mut network = built_1_1();
        let mut trainer =
            Backpropagation::new(vec![vec![0.0], vec![1.0]], vec![vec![0.0]], 0.5, 0.0);
        let err = trainer.train(&mut network, 0.01, 10).unwrap_err();
        assert_eq!(err, NetworkError::DimensionMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn train_rejects_empty_datasets() {
        let mut network = built_1_1();
        let mut trainer = Backpropagation::new(Vec::new(), Vec::new(), 0.5, 0.0);
        let err = trainer.train(&mut network, 0.01, 10).unwrap_err();
        assert_eq!(err, NetworkError::EmptyDataset);
    }

    #[test]
    fn stop_flag_ends_training_after_the_current_epoch() {
        let mut network = built_1_1();
        let mut trainer =
            Backpropagation::new(vec![vec![0.0], vec![1.0]], vec![vec![0.0], vec![1.0]], 0.5, 0.0);
        let flag = Arc::new(AtomicBool::new(true));
        trainer.set_stop_flag(Arc::clone(&flag));
        flag.store(true, Ordering::Relaxed);

        trainer.train(&mut network, 0.0, 10_000).unwrap();
        assert_eq!(trainer.epochs_run(), 1);
    }

    #[test]
    fn progress_callback_reports_with_zero_interval() {
        let mut network = built_1_1();
        let mut trainer =
            Backpropagation::new(vec![vec![0.0], vec![1.0]], vec![vec![0.1], vec![0.9]], 0.8, 0.3);
        let epochs_seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&epochs_seen);
        trainer.set_progress_callback(Duration::ZERO, move |stats| {
            assert!(stats.mean_squared_error.is_finite());
            *sink.borrow_mut() += 1;
        });

        trainer.train(&mut network, 0.01, 500).unwrap();
        assert!(*epochs_seen.borrow() >= 1);
    }
}
