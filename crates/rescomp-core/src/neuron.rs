//! Neuron models
//!
//! Two kinds of neuron exist: input neurons, which relay encoder state
//! into the reservoir, and hidden (reservoir) neurons, which advance an
//! injected activation capability each cycle. Hidden neurons are driven
//! in two externally sequenced phases: `new_stimuli` accumulates the
//! cycle's input, `new_state` advances the activation and emits the
//! next output signal. The split is what makes the data-parallel
//! simulation loop deterministic.

use crate::activation::{Activation, Interval, OutputSignalType};
use crate::geometry::NeuronPlacement;
use crate::stats::{FiringRate, NeuronStatistics};
use rescomp_math::Float;
use std::fmt;

/// Hard numeric bound applied to combined stimuli. Stimuli are clamped,
/// never rejected.
pub const MAX_ABS_STIMULUS: Float = 1e6;

/// Smoothing coefficient of the analog secondary-predictor trace
const TRACE_RETENTION: Float = 0.75;

/// Functional role of a neuron; fixes the sign of outgoing weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeuronRole {
    /// External input relay; outgoing weights keep their sampled sign
    Input,
    /// Excitatory reservoir neuron; outgoing weights are positive
    Excitatory,
    /// Inhibitory reservoir neuron; outgoing weights are negative
    Inhibitory,
}

impl NeuronRole {
    /// Sign imposed on outgoing synapse weights; `None` leaves the
    /// sampled sign unmodified
    pub fn weight_sign(&self) -> Option<Float> {
        match self {
            NeuronRole::Input => None,
            NeuronRole::Excitatory => Some(1.0),
            NeuronRole::Inhibitory => Some(-1.0),
        }
    }
}

/// Input neuron relaying one encoder field into the reservoir
#[derive(Debug, Clone)]
pub struct InputNeuron {
    /// Index of the input field this neuron relays
    pub field_index: usize,
    /// Declared range of the encoder signal
    pub range: Interval,
    output: Float,
}

impl InputNeuron {
    /// Create an input neuron at rest
    pub fn new(field_index: usize, range: Interval) -> Self {
        Self {
            field_index,
            range,
            output: 0.0,
        }
    }

    /// Push the next encoder value; values outside the declared range
    /// are clamped
    pub fn new_state(&mut self, value: Float) {
        self.output = if self.range.span() > 0.0 {
            value.clamp(self.range.min, self.range.max)
        } else {
            value
        };
    }

    /// Current output signal
    pub fn output(&self) -> Float {
        self.output
    }

    /// Restore the at-rest state
    pub fn reset(&mut self) {
        self.output = 0.0;
    }
}

/// Hidden (reservoir) neuron
pub struct HiddenNeuron {
    /// Immutable placement identity
    pub placement: NeuronPlacement,
    /// Excitatory or inhibitory role, fixed at creation
    pub role: NeuronRole,
    /// Index of the owning group within the pool, for statistics
    pub group_index: usize,
    /// Whether this neuron exports a secondary predictor when routed
    /// to the readout
    pub augmented_state: bool,
    /// Whether this neuron is eligible as a predictor
    pub readout_eligible: bool,
    activation: Box<dyn Activation>,
    bias: Float,
    retainment_rate: Float,
    output_type: OutputSignalType,
    output_range: Interval,

    // Per-cycle mutable state
    external_stimulus: Float,
    internal_stimulus: Float,
    total_stimulus: Float,
    state: Float,
    output: Float,
    trace: Float,
    firing: FiringRate,
    cycles_since_spike: Option<usize>,
    stats: NeuronStatistics,
}

impl fmt::Debug for HiddenNeuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiddenNeuron")
            .field("placement", &self.placement)
            .field("role", &self.role)
            .field("output_type", &self.output_type)
            .field("bias", &self.bias)
            .field("retainment_rate", &self.retainment_rate)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl HiddenNeuron {
    /// Create a hidden neuron from its construction-time parameters
    pub fn new(
        placement: NeuronPlacement,
        role: NeuronRole,
        group_index: usize,
        activation: Box<dyn Activation>,
        bias: Float,
        retainment_rate: Float,
        augmented_state: bool,
    ) -> Self {
        let output_type = activation.output_type();
        let output_range = activation.output_range();
        Self {
            placement,
            role,
            group_index,
            augmented_state,
            readout_eligible: false,
            activation,
            bias,
            retainment_rate,
            output_type,
            output_range,
            external_stimulus: 0.0,
            internal_stimulus: 0.0,
            total_stimulus: 0.0,
            state: 0.0,
            output: 0.0,
            trace: 0.0,
            firing: FiringRate::new(),
            cycles_since_spike: None,
            stats: NeuronStatistics::new(),
        }
    }

    /// Class of the emitted output signal
    pub fn output_type(&self) -> OutputSignalType {
        self.output_type
    }

    /// Declared range of the emitted output signal
    pub fn output_range(&self) -> Interval {
        self.output_range
    }

    /// Fixed additive bias sampled at creation
    pub fn bias(&self) -> Float {
        self.bias
    }

    /// Retainment (leaky-integration) rate; 0 disables blending
    pub fn retainment_rate(&self) -> Float {
        self.retainment_rate
    }

    /// Current output signal
    pub fn output(&self) -> Float {
        self.output
    }

    /// Current internal activation state
    pub fn state(&self) -> Float {
        self.state
    }

    /// Cycles elapsed since the last emitted spike; `None` before the
    /// first spike. Diagnostic only, maintained for spiking neurons.
    pub fn cycles_since_spike(&self) -> Option<usize> {
        self.cycles_since_spike
    }

    /// Lifetime statistics
    pub fn statistics(&self) -> &NeuronStatistics {
        &self.stats
    }

    /// Phase 1: accumulate the cycle's stimulus. Components are stored
    /// separately for statistics; the combined value is clamped.
    pub fn new_stimuli(&mut self, external: Float, internal: Float) {
        self.external_stimulus = external;
        self.internal_stimulus = internal;
        self.total_stimulus =
            (external + internal + self.bias).clamp(-MAX_ABS_STIMULUS, MAX_ABS_STIMULUS);
    }

    /// Phase 2: advance the activation and emit the next output signal
    pub fn new_state(&mut self, collect_stats: bool) {
        let mut output = self.activation.compute(self.total_stimulus);

        // Leaky integration blends the new output with the previous one
        if self.retainment_rate > 0.0 && self.output_type == OutputSignalType::Analog {
            output = self.retainment_rate * self.output + (1.0 - self.retainment_rate) * output;
        }
        self.output = output;

        self.state = match self.output_type {
            OutputSignalType::Analog => output,
            OutputSignalType::Spike => self.activation.internal_state(),
        };

        match self.output_type {
            OutputSignalType::Spike => {
                let spiked = output > 0.0;
                self.firing.update(spiked);
                if spiked {
                    self.stats.spike_count += 1;
                    self.cycles_since_spike = Some(0);
                } else if let Some(cycles) = self.cycles_since_spike.as_mut() {
                    *cycles += 1;
                }
            }
            OutputSignalType::Analog => {
                self.trace = TRACE_RETENTION * self.trace + (1.0 - TRACE_RETENTION) * output;
            }
        }

        if collect_stats {
            self.stats.external_stimulus.add_sample(self.external_stimulus);
            self.stats.internal_stimulus.add_sample(self.internal_stimulus);
            self.stats.total_stimulus.add_sample(self.total_stimulus);
            self.stats.activation.add_sample(self.state);
            self.stats.output.add_sample(self.output);
        }
    }

    /// Primary predictor value (the current output signal)
    pub fn primary_predictor(&self) -> Float {
        self.output
    }

    /// Secondary ("augmented") predictor value: windowed firing rate
    /// for spiking neurons, fading output trace for analog neurons
    pub fn secondary_predictor(&self) -> Float {
        match self.output_type {
            OutputSignalType::Spike => self.firing.rate(),
            OutputSignalType::Analog => self.trace,
        }
    }

    /// Restore per-cycle state without touching structure; statistics
    /// are cleared only when requested
    pub fn reset(&mut self, reset_statistics: bool) {
        self.activation.reset();
        self.external_stimulus = 0.0;
        self.internal_stimulus = 0.0;
        self.total_stimulus = 0.0;
        self.state = 0.0;
        self.output = 0.0;
        self.trace = 0.0;
        self.firing.reset();
        self.cycles_since_spike = None;
        if reset_statistics {
            self.stats.reset();
        }
    }
}
