//! Strongly-typed topology parameters
//!
//! Declarative configuration parsing lives upstream; this module is the
//! validated, typed form the builder consumes. Every settings struct
//! validates on construction and again via `validate`, so a reservoir
//! is never built from out-of-range densities, shares, or dimensions.

use crate::activation::{ActivationFactoryHandle, Interval};
use crate::error::{CoreError, Result};
use crate::neuron::NeuronRole;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rescomp_math::Float;
use std::fmt;

/// Magnitude distribution for sampled values (weights, biases, rates)
#[derive(Debug, Clone, PartialEq)]
pub enum RandomDist {
    /// Uniform over [min, max]
    Uniform {
        /// Lower bound
        min: Float,
        /// Upper bound
        max: Float,
    },
    /// Gaussian with the given mean and standard deviation
    Gaussian {
        /// Mean
        mean: Float,
        /// Standard deviation (>= 0)
        std_dev: Float,
    },
    /// Always the same value
    Constant {
        /// The value
        value: Float,
    },
}

impl RandomDist {
    /// Draw one value
    pub fn sample(&self, rng: &mut StdRng) -> Float {
        match self {
            RandomDist::Uniform { min, max } => {
                if max <= min {
                    *min
                } else {
                    rng.gen_range(*min..=*max)
                }
            }
            RandomDist::Gaussian { mean, std_dev } => {
                if *std_dev <= 0.0 {
                    *mean
                } else {
                    // Parameters are validated finite, Normal::new cannot fail
                    Normal::new(*mean, *std_dev)
                        .map(|n| n.sample(rng))
                        .unwrap_or(*mean)
                }
            }
            RandomDist::Constant { value } => *value,
        }
    }

    /// Validate distribution parameters
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            RandomDist::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || max < min {
                    return Err(CoreError::invalid_parameter(
                        name,
                        format!("Uniform[{}, {}]", min, max),
                        "finite bounds with max >= min",
                    ));
                }
            }
            RandomDist::Gaussian { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || *std_dev < 0.0 {
                    return Err(CoreError::invalid_parameter(
                        name,
                        format!("Gaussian({}, {})", mean, std_dev),
                        "finite mean and std_dev >= 0",
                    ));
                }
            }
            RandomDist::Constant { value } => {
                if !value.is_finite() {
                    return Err(CoreError::invalid_parameter(
                        name,
                        value.to_string(),
                        "finite value",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Dynamic-efficacy model selection for a synapse population
#[derive(Debug, Clone, PartialEq)]
pub enum SynapseKind {
    /// Efficacy is constant 1
    Static,
    /// Short-term facilitation/depression
    Dynamic {
        /// Resting utilization (U), in (0, 1]
        resting_efficacy: Float,
        /// Facilitation time constant in cycles (> 0)
        tau_facilitation: Float,
        /// Depression time constant in cycles (> 0)
        tau_depression: Float,
    },
}

/// Parameters shared by one population of synapses
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseSettings {
    /// Static or dynamic efficacy model
    pub kind: SynapseKind,
    /// Weight magnitude distribution
    pub weight: RandomDist,
    /// Upper bound of the distance-derived transmission delay
    pub max_delay: usize,
}

impl Default for SynapseSettings {
    fn default() -> Self {
        Self {
            kind: SynapseKind::Static,
            weight: RandomDist::Uniform { min: 0.0, max: 1.0 },
            max_delay: 0,
        }
    }
}

impl SynapseSettings {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        self.weight.validate("synapse.weight")?;
        if let SynapseKind::Dynamic {
            resting_efficacy,
            tau_facilitation,
            tau_depression,
        } = self.kind
        {
            if !(resting_efficacy > 0.0 && resting_efficacy <= 1.0) {
                return Err(CoreError::invalid_parameter(
                    "synapse.resting_efficacy",
                    resting_efficacy.to_string(),
                    "in (0, 1]",
                ));
            }
            if tau_facilitation <= 0.0 {
                return Err(CoreError::invalid_parameter(
                    "synapse.tau_facilitation",
                    tau_facilitation.to_string(),
                    "> 0",
                ));
            }
            if tau_depression <= 0.0 {
                return Err(CoreError::invalid_parameter(
                    "synapse.tau_depression",
                    tau_depression.to_string(),
                    "> 0",
                ));
            }
        }
        Ok(())
    }
}

/// One neuron group within a pool
#[derive(Clone)]
pub struct NeuronGroupSettings {
    /// Group name (statistics reporting)
    pub name: String,
    /// Excitatory or inhibitory role of every neuron in the group
    pub role: NeuronRole,
    /// Relative share of the pool's slots (> 0)
    pub relative_share: Float,
    /// Factory producing one activation instance per neuron
    pub activation: ActivationFactoryHandle,
    /// Bias distribution, sampled once per neuron
    pub bias: RandomDist,
    /// Whether predictor neurons of this group also export a secondary
    /// (augmented) predictor value
    pub augmented_states: bool,
}

impl fmt::Debug for NeuronGroupSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeuronGroupSettings")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("relative_share", &self.relative_share)
            .field("bias", &self.bias)
            .field("augmented_states", &self.augmented_states)
            .finish_non_exhaustive()
    }
}

impl NeuronGroupSettings {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.role == NeuronRole::Input {
            return Err(CoreError::invalid_parameter(
                "group.role",
                "Input",
                "Excitatory or Inhibitory",
            ));
        }
        if !(self.relative_share > 0.0) {
            return Err(CoreError::invalid_parameter(
                "group.relative_share",
                self.relative_share.to_string(),
                "> 0",
            ));
        }
        self.bias.validate("group.bias")
    }
}

/// Intra-pool interconnection policy
#[derive(Debug, Clone, PartialEq)]
pub struct InterconnectSettings {
    /// Fraction of the pool's size^2 turned into synapses, in [0, 1]
    pub density: Float,
    /// Preferred connection distance; <= 0 selects targets uniformly
    pub avg_distance: Float,
    /// Whether a neuron may target itself
    pub allow_self_connections: bool,
    /// Gaussian-perturb planned per-source out-degrees instead of
    /// using the exact average
    pub gaussian_fan_out: bool,
    /// Synapse population parameters
    pub synapse: SynapseSettings,
}

impl Default for InterconnectSettings {
    fn default() -> Self {
        Self {
            density: 0.1,
            avg_distance: 0.0,
            allow_self_connections: true,
            gaussian_fan_out: false,
            synapse: SynapseSettings::default(),
        }
    }
}

impl InterconnectSettings {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        validate_density("interconnect.density", self.density)?;
        self.synapse.validate()
    }
}

/// Leaky-integration (retainment) policy for a pool's analog neurons
#[derive(Debug, Clone, PartialEq)]
pub struct RetainmentSettings {
    /// Fraction of analog neurons receiving retainment, in [0, 1]
    pub density: Float,
    /// Retention-rate distribution; sampled values are clamped to [0, 1)
    pub rate: RandomDist,
}

impl RetainmentSettings {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        validate_density("retainment.density", self.density)?;
        self.rate.validate("retainment.rate")
    }
}

/// One 3-D pool of reservoir neurons
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Pool name (statistics reporting)
    pub name: String,
    /// Grid extent along X (> 0)
    pub dim_x: usize,
    /// Grid extent along Y (> 0)
    pub dim_y: usize,
    /// Grid extent along Z (> 0)
    pub dim_z: usize,
    /// Neuron group composition
    pub groups: Vec<NeuronGroupSettings>,
    /// Intra-pool wiring policy
    pub interconnect: InterconnectSettings,
    /// Optional leaky-integration feature
    pub retainment: Option<RetainmentSettings>,
    /// Fraction of the pool's neurons eligible as predictors, in [0, 1]
    pub readout_density: Float,
}

impl PoolSettings {
    /// Number of neuron slots in the pool
    pub fn size(&self) -> usize {
        self.dim_x * self.dim_y * self.dim_z
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.dim_x == 0 || self.dim_y == 0 || self.dim_z == 0 {
            return Err(CoreError::invalid_parameter(
                "pool.dimensions",
                format!("{}x{}x{}", self.dim_x, self.dim_y, self.dim_z),
                "all > 0",
            ));
        }
        if self.groups.is_empty() {
            return Err(CoreError::invalid_parameter(
                "pool.groups",
                "empty",
                "at least one neuron group",
            ));
        }
        for group in &self.groups {
            group.validate()?;
        }
        self.interconnect.validate()?;
        if let Some(retainment) = &self.retainment {
            retainment.validate()?;
        }
        validate_density("pool.readout_density", self.readout_density)
    }
}

/// Assignment of one input field to one pool
#[derive(Debug, Clone, PartialEq)]
pub struct InputAssignment {
    /// Target pool index
    pub pool: usize,
    /// Fraction of the pool's neurons receiving this field, in [0, 1]
    pub density: Float,
    /// Synapse population parameters for this assignment
    pub synapse: SynapseSettings,
}

/// One scalar input field feeding the reservoir
#[derive(Debug, Clone, PartialEq)]
pub struct InputFieldSettings {
    /// Field name
    pub name: String,
    /// Declared range of the encoder signal
    pub range: Interval,
    /// Pools this field projects into
    pub assignments: Vec<InputAssignment>,
}

impl InputFieldSettings {
    /// Validate parameters against the configured pool count
    pub fn validate(&self, pools: usize) -> Result<()> {
        for assignment in &self.assignments {
            if assignment.pool >= pools {
                return Err(CoreError::PoolNotFound {
                    pool: assignment.pool,
                    pools,
                });
            }
            validate_density("input.density", assignment.density)?;
            assignment.synapse.validate()?;
        }
        Ok(())
    }
}

/// Directed pool-to-pool projection
#[derive(Debug, Clone, PartialEq)]
pub struct PoolLinkSettings {
    /// Source pool index
    pub source_pool: usize,
    /// Target pool index
    pub target_pool: usize,
    /// Fraction of source-pool neurons feeding each target, in [0, 1]
    pub source_density: Float,
    /// Fraction of target-pool neurons receiving the link, in [0, 1]
    pub target_density: Float,
    /// Gaussian-perturb the per-target fan-in instead of the exact count
    pub gaussian_fan_in: bool,
    /// Synapse population parameters
    pub synapse: SynapseSettings,
}

impl PoolLinkSettings {
    /// Validate parameters against the configured pool count
    pub fn validate(&self, pools: usize) -> Result<()> {
        for pool in [self.source_pool, self.target_pool] {
            if pool >= pools {
                return Err(CoreError::PoolNotFound { pool, pools });
            }
        }
        validate_density("link.source_density", self.source_density)?;
        validate_density("link.target_density", self.target_density)?;
        self.synapse.validate()
    }
}

/// Complete reservoir construction parameters
#[derive(Debug, Clone)]
pub struct ReservoirSettings {
    /// Seed for the single construction RNG; negative requests true
    /// randomness, non-negative gives a reproducible topology
    pub seed: i64,
    /// Micro-cycles executed per `compute` call (> 0)
    pub input_duration: usize,
    /// Optional target spectral radius (> 0 when present)
    pub spectral_radius: Option<Float>,
    /// Pool definitions
    pub pools: Vec<PoolSettings>,
    /// Input fields and their pool assignments
    pub input_fields: Vec<InputFieldSettings>,
    /// Optional pool-to-pool projections
    pub pool_links: Vec<PoolLinkSettings>,
}

impl ReservoirSettings {
    /// Validate the whole settings tree, including cross-references
    pub fn validate(&self) -> Result<()> {
        if self.input_duration == 0 {
            return Err(CoreError::invalid_parameter(
                "input_duration",
                "0",
                "> 0",
            ));
        }
        if let Some(radius) = self.spectral_radius {
            if !(radius > 0.0) || !radius.is_finite() {
                return Err(CoreError::invalid_parameter(
                    "spectral_radius",
                    radius.to_string(),
                    "finite and > 0",
                ));
            }
        }
        if self.pools.is_empty() {
            return Err(CoreError::invalid_parameter(
                "pools",
                "empty",
                "at least one pool",
            ));
        }
        for pool in &self.pools {
            pool.validate()?;
        }
        if self.input_fields.is_empty() {
            return Err(CoreError::invalid_parameter(
                "input_fields",
                "empty",
                "at least one input field",
            ));
        }
        for field in &self.input_fields {
            field.validate(self.pools.len())?;
        }
        for link in &self.pool_links {
            link.validate(self.pools.len())?;
        }
        Ok(())
    }

    /// Create the single construction RNG from the configured seed
    pub fn create_rng(&self) -> StdRng {
        if self.seed < 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(self.seed as u64)
        }
    }

    /// Total number of reservoir neurons across all pools
    pub fn total_size(&self) -> usize {
        self.pools.iter().map(PoolSettings::size).sum()
    }
}

fn validate_density(name: &str, density: Float) -> Result<()> {
    if !(0.0..=1.0).contains(&density) || !density.is_finite() {
        return Err(CoreError::invalid_parameter(
            name,
            density.to_string(),
            "in [0, 1]",
        ));
    }
    Ok(())
}
