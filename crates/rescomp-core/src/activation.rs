//! Activation capability objects
//!
//! The reservoir core does not own activation-function implementations;
//! it drives injected capability objects that advance an internal state
//! from an accumulated stimulus and declare the class (spike/analog)
//! and range of the signal they emit. Two stock implementations are
//! provided for defaults and tests: a hyperbolic-tangent analog unit
//! and a leaky integrate-and-fire spiking unit.

use rescomp_math::Float;
use std::sync::Arc;

/// Class of signal a neuron emits each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSignalType {
    /// Binary transmission signal (0 or 1)
    Spike,
    /// Continuous-valued transmission signal
    Analog,
}

/// Closed interval of attainable output values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound
    pub min: Float,
    /// Upper bound
    pub max: Float,
}

impl Interval {
    /// The unit interval [0, 1]
    pub const UNIT: Interval = Interval { min: 0.0, max: 1.0 };

    /// The symmetric interval [-1, 1]
    pub const SYMMETRIC_UNIT: Interval = Interval {
        min: -1.0,
        max: 1.0,
    };

    /// Create an interval
    pub const fn new(min: Float, max: Float) -> Self {
        Self { min, max }
    }

    /// Width of the interval
    pub fn span(&self) -> Float {
        self.max - self.min
    }

    /// Whether a value lies inside the interval (inclusive)
    pub fn contains(&self, value: Float) -> bool {
        value >= self.min && value <= self.max
    }

    /// Rescale a value from this interval into a target interval.
    ///
    /// Degenerate spans on either side degrade to pass-through rather
    /// than dividing by zero.
    pub fn rescale(&self, value: Float, target: &Interval) -> Float {
        let span = self.span();
        let target_span = target.span();
        if span <= 0.0 || target_span <= 0.0 {
            return value;
        }
        let unit = ((value - self.min) / span).clamp(0.0, 1.0);
        target.min + unit * target_span
    }
}

/// Per-cycle activation capability driven by the reservoir core.
///
/// `compute` consumes the accumulated stimulus and returns the output
/// signal for the cycle; `internal_state` exposes the post-compute
/// internal activation (for spiking units this differs from the
/// emitted signal).
pub trait Activation: Send {
    /// Advance the internal state and return the emitted output signal
    fn compute(&mut self, stimulus: Float) -> Float;

    /// Internal activation after the last `compute`
    fn internal_state(&self) -> Float;

    /// Class of the emitted signal
    fn output_type(&self) -> OutputSignalType;

    /// Range of the emitted signal
    fn output_range(&self) -> Interval;

    /// Restore the pristine post-construction state
    fn reset(&mut self);
}

/// Factory producing fresh activation instances, one per neuron.
///
/// Implemented for any `Fn() -> Box<dyn Activation>` closure, so a
/// group can inject custom activations without a named type.
pub trait ActivationFactory: Send + Sync {
    /// Create a fresh activation instance
    fn create(&self) -> Box<dyn Activation>;
}

impl<F> ActivationFactory for F
where
    F: Fn() -> Box<dyn Activation> + Send + Sync,
{
    fn create(&self) -> Box<dyn Activation> {
        self()
    }
}

/// Shared factory handle carried by group settings
pub type ActivationFactoryHandle = Arc<dyn ActivationFactory>;

/// Hyperbolic tangent analog activation: state = tanh(stimulus)
#[derive(Debug, Clone, Copy)]
pub struct Tanh {
    state: Float,
}

impl Tanh {
    /// Create a tanh activation at rest
    pub fn new() -> Self {
        Self { state: 0.0 }
    }

    /// Factory handle for group settings
    pub fn factory() -> ActivationFactoryHandle {
        Arc::new(|| Box::new(Tanh::new()) as Box<dyn Activation>)
    }
}

impl Default for Tanh {
    fn default() -> Self {
        Self::new()
    }
}

impl Activation for Tanh {
    fn compute(&mut self, stimulus: Float) -> Float {
        self.state = stimulus.tanh();
        self.state
    }

    fn internal_state(&self) -> Float {
        self.state
    }

    fn output_type(&self) -> OutputSignalType {
        OutputSignalType::Analog
    }

    fn output_range(&self) -> Interval {
        Interval::SYMMETRIC_UNIT
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Leaky integrate-and-fire spiking activation.
///
/// The membrane decays toward rest each cycle, accumulates the
/// stimulus, and emits a unit spike on crossing the threshold, after
/// which it is reset.
#[derive(Debug, Clone, Copy)]
pub struct SpikingIf {
    /// Fraction of membrane potential lost per cycle
    pub decay: Float,
    /// Firing threshold
    pub threshold: Float,
    /// Post-spike membrane potential
    pub reset_potential: Float,
    membrane: Float,
}

impl SpikingIf {
    /// Create a spiking unit with explicit parameters
    pub fn new(decay: Float, threshold: Float, reset_potential: Float) -> Self {
        Self {
            decay,
            threshold,
            reset_potential,
            membrane: 0.0,
        }
    }

    /// Factory handle with conventional parameters
    pub fn factory() -> ActivationFactoryHandle {
        Arc::new(|| Box::new(SpikingIf::default()) as Box<dyn Activation>)
    }
}

impl Default for SpikingIf {
    fn default() -> Self {
        Self::new(0.05, 1.0, 0.0)
    }
}

impl Activation for SpikingIf {
    fn compute(&mut self, stimulus: Float) -> Float {
        self.membrane = self.membrane * (1.0 - self.decay) + stimulus;
        if self.membrane >= self.threshold {
            self.membrane = self.reset_potential;
            1.0
        } else {
            if self.membrane < 0.0 {
                self.membrane = 0.0;
            }
            0.0
        }
    }

    fn internal_state(&self) -> Float {
        self.membrane
    }

    fn output_type(&self) -> OutputSignalType {
        OutputSignalType::Spike
    }

    fn output_range(&self) -> Interval {
        Interval::UNIT
    }

    fn reset(&mut self) {
        self.membrane = 0.0;
    }
}
