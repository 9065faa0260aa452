//! Observability layer: neuron, synapse and reservoir statistics
//!
//! Nothing here is required for simulation correctness; the aggregates
//! exist so a tuning workflow can inspect stimulus, activation, output,
//! efficacy and weight distributions per pool and group.

use rescomp_math::{BasicStat, Float};
use std::sync::OnceLock;

/// Length of the spike history window used for firing-rate estimation
pub const FIRING_RATE_WINDOW: usize = 64;

/// Decay constant (in cycles) of the firing-rate window weights
const FIRING_RATE_TAU: Float = 16.0;

static DECAY_WEIGHTS: OnceLock<[Float; FIRING_RATE_WINDOW]> = OnceLock::new();

/// Exponential decay weights of the firing-rate window, newest first.
///
/// Computed once on first use, immutable thereafter; the weights are
/// normalized so a fully saturated history yields a rate of exactly 1.
fn decay_weights() -> &'static [Float; FIRING_RATE_WINDOW] {
    DECAY_WEIGHTS.get_or_init(|| {
        let mut weights = [0.0; FIRING_RATE_WINDOW];
        let mut sum = 0.0;
        for (i, w) in weights.iter_mut().enumerate() {
            *w = (-(i as Float) / FIRING_RATE_TAU).exp();
            sum += *w;
        }
        for w in weights.iter_mut() {
            *w /= sum;
        }
        weights
    })
}

/// Exponentially weighted firing rate over a rolling spike window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiringRate {
    history: u64,
}

impl FiringRate {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the window by one cycle, recording whether a spike occurred
    pub fn update(&mut self, spiked: bool) {
        self.history = (self.history << 1) | spiked as u64;
    }

    /// Weighted firing rate in [0, 1]; recent spikes weigh more
    pub fn rate(&self) -> Float {
        if self.history == 0 {
            return 0.0;
        }
        let weights = decay_weights();
        let mut rate = 0.0;
        for (i, w) in weights.iter().enumerate() {
            if (self.history >> i) & 1 == 1 {
                rate += w;
            }
        }
        rate
    }

    /// Number of spikes currently inside the window
    pub fn spikes_in_window(&self) -> u32 {
        self.history.count_ones()
    }

    /// Clear the history
    pub fn reset(&mut self) {
        self.history = 0;
    }
}

/// Lifetime statistics of one neuron
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeuronStatistics {
    /// External (input-synapse) stimulus component
    pub external_stimulus: BasicStat,
    /// Internal (pool-synapse) stimulus component
    pub internal_stimulus: BasicStat,
    /// Combined clamped stimulus
    pub total_stimulus: BasicStat,
    /// Internal activation state
    pub activation: BasicStat,
    /// Emitted output signal
    pub output: BasicStat,
    /// Total spikes emitted (spiking neurons only)
    pub spike_count: usize,
}

impl NeuronStatistics {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only snapshot of a `BasicStat`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatSummary {
    /// Number of samples
    pub count: usize,
    /// Arithmetic mean
    pub mean: Float,
    /// Population standard deviation
    pub std_dev: Float,
    /// Smallest sample
    pub min: Float,
    /// Largest sample
    pub max: Float,
    /// Distance between extremes
    pub span: Float,
}

impl From<&BasicStat> for StatSummary {
    fn from(stat: &BasicStat) -> Self {
        Self {
            count: stat.count(),
            mean: stat.mean(),
            std_dev: stat.std_dev(),
            min: stat.min(),
            max: stat.max(),
            span: stat.span(),
        }
    }
}

/// Aggregates for one neuron group within a pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStat {
    /// Group name
    pub name: String,
    /// Number of neurons in the group
    pub neuron_count: usize,
    /// Combined stimulus aggregate across the group's neurons
    pub total_stimulus: StatSummary,
    /// Activation-state aggregate
    pub activation: StatSummary,
    /// Output-signal aggregate
    pub output: StatSummary,
    /// Total spikes emitted by the group
    pub spike_count: usize,
}

/// Aggregates for one pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStat {
    /// Pool name
    pub name: String,
    /// Number of neurons in the pool
    pub neuron_count: usize,
    /// Per-group aggregates
    pub groups: Vec<GroupStat>,
    /// Input-synapse weight aggregate (fixed at construction)
    pub input_weights: StatSummary,
    /// Internal-synapse weight aggregate (post-rescale)
    pub internal_weights: StatSummary,
    /// Dynamic-synapse efficacy aggregate
    pub synapse_efficacy: StatSummary,
}

/// Full reservoir statistics snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservoirStat {
    /// Number of reservoir neurons
    pub neuron_count: usize,
    /// Number of synapses (input + internal)
    pub synapse_count: usize,
    /// Estimated spectral radius after construction, if normalized
    pub spectral_radius: Option<Float>,
    /// Per-pool aggregates
    pub pools: Vec<PoolStat>,
}
