//! Incremental statistics accumulator
//!
//! The simulation loop cannot afford to buffer samples, so statistics
//! are folded in one value at a time and summarized on demand.

use crate::Float;

/// Running aggregate over a stream of samples
#[derive(Debug, Clone, PartialEq)]
pub struct BasicStat {
    count: usize,
    sum: Float,
    sum_of_squares: Float,
    min: Float,
    max: Float,
}

impl Default for BasicStat {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicStat {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_of_squares: 0.0,
            min: Float::INFINITY,
            max: Float::NEG_INFINITY,
        }
    }

    /// Fold one sample into the aggregate
    pub fn add_sample(&mut self, value: Float) {
        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Merge another aggregate into this one
    pub fn merge(&mut self, other: &BasicStat) {
        if other.count == 0 {
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.sum_of_squares += other.sum_of_squares;
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
    }

    /// Number of samples seen
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sum of all samples
    pub fn sum(&self) -> Float {
        self.sum
    }

    /// Arithmetic mean; 0.0 when empty
    pub fn mean(&self) -> Float {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as Float
        }
    }

    /// Population variance; 0.0 when empty
    pub fn variance(&self) -> Float {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_of_squares / self.count as Float - mean * mean).max(0.0)
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> Float {
        self.variance().sqrt()
    }

    /// Smallest sample; 0.0 when empty
    pub fn min(&self) -> Float {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    /// Largest sample; 0.0 when empty
    pub fn max(&self) -> Float {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Distance between the extremes
    pub fn span(&self) -> Float {
        self.max() - self.min()
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
