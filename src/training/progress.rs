use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Statistics handed to a progress callback at the end of an epoch.
#[derive(Debug, Clone)]
pub struct TrainingStats {
    pub epoch: usize,
    pub mean_squared_error: f64,
}

/// Drives the caller-supplied progress callback between epochs, throttled
/// by wall-clock interval rather than epoch count, and carries the
/// optional cooperative stop flag checked once per epoch.
///
/// The callback receives statistics only - the network and training
/// buffers stay private to the trainer while it runs.
pub(crate) struct ProgressReporter {
    callback: Option<Box<dyn FnMut(&TrainingStats)>>,
    interval: Duration,
    last_report: Option<Instant>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl ProgressReporter {
    pub fn new() -> ProgressReporter {
        ProgressReporter {
            callback: None,
            interval: Duration::from_millis(1000),
            last_report: None,
            stop_flag: None,
        }
    }

    pub fn set_callback(
        &mut self,
        interval: Duration,
        callback: impl FnMut(&TrainingStats) + 'static,
    ) {
        self.interval = interval;
        self.callback = Some(Box::new(callback));
    }

    pub fn set_stop_flag(&mut self, flag: Arc<AtomicBool>) {
        self.stop_flag = Some(flag);
    }

    /// Invokes the callback if the configured interval has elapsed since
    /// the previous invocation. The first eligible epoch always reports.
    pub fn report(&mut self, epoch: usize, mean_squared_error: f64) {
        if let Some(callback) = &mut self.callback {
            let due = match self.last_report {
                Some(at) => at.elapsed() >= self.interval,
                None => true,
            };
            if due {
                callback(&TrainingStats { epoch, mean_squared_error });
                self.last_report = Some(Instant::now());
            }
        }
    }

    pub fn should_stop(&self) -> bool {
        self.stop_flag
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}
