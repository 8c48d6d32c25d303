pub mod backpropagation;
pub mod genetic;
pub mod progress;
pub mod resilient;

mod gradient;

pub use backpropagation::Backpropagation;
pub use genetic::breed;
pub use progress::TrainingStats;
pub use resilient::ResilientPropagation;

use crate::error::Result;
use crate::network::Network;

/// Supervised trainers drive a built [`Network`] toward a lower mean
/// squared error over a fixed dataset, mutating its weights in place.
///
/// Training blocks the caller until the accepted error or the epoch
/// budget is reached; the optional progress callback and stop flag are
/// serviced once per epoch.
pub trait Trainer {
    /// Trains the network and returns the final mean squared error.
    fn train(
        &mut self,
        network: &mut Network,
        accepted_error: f64,
        max_epochs: usize,
    ) -> Result<f64>;

    /// Mean squared error after the most recent epoch.
    fn mean_squared_error(&self) -> f64;

    /// Epochs completed in the most recent training run.
    fn epochs_run(&self) -> usize;

    /// Human-readable report of the most recent training run.
    fn summary(&self) -> String;
}
