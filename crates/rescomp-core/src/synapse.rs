//! Synapse models
//!
//! A synapse connects one source neuron to one target neuron. Per
//! cycle it converts the source's output signal into the target's
//! domain, applies its fixed weight and a dynamic efficacy factor, and
//! pushes the result through a fixed-capacity delay line. `get_signal`
//! must be called exactly once per cycle; the internal state advances
//! each call, so calling it more or fewer times desynchronizes the
//! delay queue. That precondition is not checked in the hot loop.

use crate::activation::{Interval, OutputSignalType};
use crate::settings::SynapseKind;
use rescomp_math::{BasicStat, Float};
use smallvec::SmallVec;

/// Source endpoint of a synapse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynapseSource {
    /// Input neuron, by input-field index
    Input(usize),
    /// Hidden neuron, by global reservoir index
    Hidden(usize),
}

/// Precomputed source-to-target signal-domain conversion.
///
/// Spike targets receive signals rescaled into [0, 1]; analog targets
/// receive signals rescaled into their declared range. Degenerate
/// ranges degrade to pass-through rather than failing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConversion {
    source_range: Interval,
    target_range: Interval,
}

impl SignalConversion {
    /// Build the conversion for a (source range, target class/range) pair
    pub fn new(
        source_range: Interval,
        target_type: OutputSignalType,
        target_range: Interval,
    ) -> Self {
        let target_range = match target_type {
            OutputSignalType::Spike => Interval::UNIT,
            OutputSignalType::Analog => target_range,
        };
        Self {
            source_range,
            target_range,
        }
    }

    /// Convert one source output signal into the target's domain
    pub fn convert(&self, signal: Float) -> Float {
        self.source_range.rescale(signal, &self.target_range)
    }
}

/// Fixed-capacity FIFO modeling transmission delay.
///
/// Capacity is `delay + 1`. Each shift first pops the oldest entry if
/// the line is full (else yields 0, the signal still "in flight"),
/// then pushes the new value; a zero-delay line therefore delivers a
/// signal on the call after it was pushed.
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: SmallVec<[Float; 4]>,
    head: usize,
    len: usize,
}

impl DelayLine {
    fn new(delay: usize) -> Self {
        let capacity = delay + 1;
        let mut buffer = SmallVec::new();
        buffer.resize(capacity, 0.0);
        Self {
            buffer,
            head: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn shift(&mut self, value: Float) -> Float {
        let capacity = self.capacity();
        let out = if self.len == capacity {
            let v = self.buffer[self.head];
            self.head = (self.head + 1) % capacity;
            self.len -= 1;
            v
        } else {
            0.0
        };
        let tail = (self.head + self.len) % capacity;
        self.buffer[tail] = value;
        self.len += 1;
        out
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        for slot in self.buffer.iter_mut() {
            *slot = 0.0;
        }
    }
}

/// Short-term facilitation/depression state (Tsodyks-Markram style,
/// one cycle per update)
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicState {
    resting_efficacy: Float,
    decay_facilitation: Float,
    decay_depression: Float,
    utilization: Float,
    resources: Float,
}

impl DynamicState {
    fn new(resting_efficacy: Float, tau_facilitation: Float, tau_depression: Float) -> Self {
        Self {
            resting_efficacy,
            decay_facilitation: (-1.0 / tau_facilitation).exp(),
            decay_depression: (-1.0 / tau_depression).exp(),
            utilization: resting_efficacy,
            resources: 1.0,
        }
    }

    /// Advance one cycle and return the efficacy factor in [0, 1].
    /// `activity` is the converted source signal magnitude in [0, 1].
    fn update(&mut self, activity: Float) -> Float {
        // Relaxation toward rest: utilization decays to the resting
        // level, resources recover toward 1
        self.utilization = self.resting_efficacy
            + (self.utilization - self.resting_efficacy) * self.decay_facilitation;
        self.resources = 1.0 - (1.0 - self.resources) * self.decay_depression;

        let efficacy = (self.utilization * self.resources).clamp(0.0, 1.0);

        if activity > 0.0 {
            // Presynaptic activity facilitates utilization and
            // depletes resources in proportion to the released amount
            self.utilization = (self.utilization
                + self.resting_efficacy * (1.0 - self.utilization) * activity)
                .min(1.0);
            self.resources = (self.resources - efficacy * self.resources * activity).max(0.0);
        }

        efficacy
    }

    fn reset(&mut self) {
        self.utilization = self.resting_efficacy;
        self.resources = 1.0;
    }
}

/// Efficacy model of a synapse; the variant set is closed
#[derive(Debug, Clone, PartialEq)]
pub enum Plasticity {
    /// Efficacy is constant 1
    Static,
    /// Short-term facilitation/depression
    Dynamic(DynamicState),
}

impl Plasticity {
    fn from_kind(kind: &SynapseKind) -> Self {
        match kind {
            SynapseKind::Static => Plasticity::Static,
            SynapseKind::Dynamic {
                resting_efficacy,
                tau_facilitation,
                tau_depression,
            } => Plasticity::Dynamic(DynamicState::new(
                *resting_efficacy,
                *tau_facilitation,
                *tau_depression,
            )),
        }
    }
}

/// Directed, weighted, delayed connection between two neurons
#[derive(Debug, Clone)]
pub struct Synapse {
    /// Source endpoint
    pub source: SynapseSource,
    /// Global index of the target hidden neuron
    pub target: usize,
    weight: Float,
    delay: usize,
    conversion: SignalConversion,
    plasticity: Plasticity,
    queue: DelayLine,
    efficacy_stat: BasicStat,
}

impl Synapse {
    /// Create a synapse with a fixed signed weight and integer delay
    pub fn new(
        source: SynapseSource,
        target: usize,
        weight: Float,
        delay: usize,
        conversion: SignalConversion,
        kind: &SynapseKind,
    ) -> Self {
        Self {
            source,
            target,
            weight,
            delay,
            conversion,
            plasticity: Plasticity::from_kind(kind),
            queue: DelayLine::new(delay),
            efficacy_stat: BasicStat::new(),
        }
    }

    /// Fixed signed weight
    pub fn weight(&self) -> Float {
        self.weight
    }

    /// Transmission delay in cycles
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Delay-line capacity (`delay + 1`)
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Whether this synapse carries a dynamic efficacy model
    pub fn is_dynamic(&self) -> bool {
        matches!(self.plasticity, Plasticity::Dynamic(_))
    }

    /// Recorded efficacy aggregate (dynamic synapses only)
    pub fn efficacy_statistics(&self) -> &BasicStat {
        &self.efficacy_stat
    }

    /// Rescale the weight in place (spectral-radius normalization)
    pub fn scale_weight(&mut self, factor: Float) {
        self.weight *= factor;
    }

    /// Advance one cycle: convert, weigh, apply efficacy, and shift
    /// through the delay line. Must be called exactly once per cycle.
    pub fn get_signal(&mut self, source_output: Float, collect_stats: bool) -> Float {
        let converted = self.conversion.convert(source_output);

        let efficacy = match &mut self.plasticity {
            Plasticity::Static => 1.0,
            Plasticity::Dynamic(state) => {
                let activity = converted.abs().min(1.0);
                let efficacy = state.update(activity);
                if collect_stats {
                    self.efficacy_stat.add_sample(efficacy);
                }
                efficacy
            }
        };

        self.queue.shift(converted * self.weight * efficacy)
    }

    /// Restore per-cycle state; structure (weight, delay, endpoints)
    /// is untouched
    pub fn reset(&mut self, reset_statistics: bool) {
        self.queue.clear();
        if let Plasticity::Dynamic(state) = &mut self.plasticity {
            state.reset();
        }
        if reset_statistics {
            self.efficacy_stat.reset();
        }
    }
}
