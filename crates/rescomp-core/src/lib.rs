//! Reservoir-computing core: randomized recurrent topology construction
//! and a deterministic two-phase simulation loop
//!
//! A reservoir is a fixed, randomly wired recurrent network of spiking
//! and analog neurons connected by weighted, delayed, optionally
//! plastic synapses. It is built once from strongly-typed settings and
//! a single seeded random stream, then driven forward in discrete time:
//! each `compute` call fans an input vector to the input neurons, runs
//! a configured number of micro-cycles, and leaves a high-dimensional
//! predictor vector readable via `copy_predictors_to` for a downstream
//! trainable readout layer. Reservoir weights are never trained.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export numeric support
pub use rescomp_math::{estimate_dominant_eigenvalue, BasicStat, Float, MathError, SparseMatrix};

// Core modules
pub mod activation;
pub mod error;
pub mod geometry;
pub mod neuron;
pub mod reservoir;
pub mod settings;
pub mod stats;
pub mod synapse;

mod topology;

// Re-export essential types
pub use activation::{
    Activation, ActivationFactory, ActivationFactoryHandle, Interval, OutputSignalType, SpikingIf,
    Tanh,
};
pub use error::{CoreError, Result};
pub use geometry::{NeuronPlacement, PoolGrid};
pub use neuron::{HiddenNeuron, InputNeuron, NeuronRole, MAX_ABS_STIMULUS};
pub use reservoir::{PredictorNeuron, Reservoir};
pub use settings::{
    InputAssignment, InputFieldSettings, InterconnectSettings, NeuronGroupSettings,
    PoolLinkSettings, PoolSettings, RandomDist, ReservoirSettings, RetainmentSettings,
    SynapseKind, SynapseSettings,
};
pub use stats::{
    FiringRate, GroupStat, NeuronStatistics, PoolStat, ReservoirStat, StatSummary,
    FIRING_RATE_WINDOW,
};
pub use synapse::{Plasticity, SignalConversion, Synapse, SynapseSource};
pub use topology::PoolLayout;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        // All components importable and basic objects constructible
        let interconnect = InterconnectSettings::default();
        assert!(interconnect.density > 0.0);

        let synapse = SynapseSettings::default();
        assert_eq!(synapse.max_delay, 0);

        let interval = Interval::SYMMETRIC_UNIT;
        assert_eq!(interval.span(), 2.0);
    }
}
