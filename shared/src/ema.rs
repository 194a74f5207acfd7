use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Exponential moving average with a running variance.
///
/// `value` and `variance` are published as single atomic words so another
/// thread may read them while the owner keeps adding samples. Writes are
/// expected to come from one context at a time.
#[derive(Debug)]
pub struct ExponentialMovingAverage {
    n: usize,
    alpha: f64,
    initialized: AtomicBool,
    value: AtomicU64,
    variance: AtomicU64,
}

impl ExponentialMovingAverage {
    /// `n` is the number of samples that make up the recency-weighted window
    pub fn new(n: usize) -> Self {
        Self {
            n,
            alpha: 2.0 / (n as f64 + 1.0),
            initialized: AtomicBool::new(false),
            value: AtomicU64::new(0f64.to_bits()),
            variance: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn add(&self, sample: f64) {
        if !self.initialized.load(Ordering::Acquire) {
            // first sample becomes the value, with no variance yet
            self.value.store(sample.to_bits(), Ordering::Release);
            self.variance.store(0f64.to_bits(), Ordering::Release);
            self.initialized.store(true, Ordering::Release);
            return;
        }

        let value = self.value();
        let variance = self.variance();

        let delta = sample - value;
        let new_value = value + self.alpha * delta;
        let new_variance = (1.0 - self.alpha) * (variance + self.alpha * delta * delta);

        self.value.store(new_value.to_bits(), Ordering::Release);
        self.variance.store(new_variance.to_bits(), Ordering::Release);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    pub fn variance(&self) -> f64 {
        f64::from_bits(self.variance.load(Ordering::Acquire))
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Whether at least one sample has been added
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn window(&self) -> usize {
        self.n
    }
}

impl Clone for ExponentialMovingAverage {
    fn clone(&self) -> Self {
        Self {
            n: self.n,
            alpha: self.alpha,
            initialized: AtomicBool::new(self.is_initialized()),
            value: AtomicU64::new(self.value().to_bits()),
            variance: AtomicU64::new(self.variance().to_bits()),
        }
    }
}
