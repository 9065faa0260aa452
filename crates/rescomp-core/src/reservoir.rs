//! Reservoir facade and simulation loop
//!
//! The reservoir owns every structural entity the topology builder
//! produced and drives them through discrete time. One `compute` call
//! runs `input_duration` micro-cycles; each micro-cycle is two phases
//! over the neuron arena with a hard barrier in between:
//!
//! 1. gather — every neuron sums its inbound synapse signals, reading
//!    only the previous cycle's output snapshots;
//! 2. advance — every neuron advances its activation and emits the
//!    next output signal.
//!
//! Each neuron and each synapse bank is touched by exactly one worker
//! per phase, so both phases parallelize without locks and the result
//! is identical to the sequential order. The instance is not
//! reentrant; concurrent external calls are unsupported.

use crate::error::{CoreError, Result};
use crate::neuron::{HiddenNeuron, InputNeuron};
use crate::settings::ReservoirSettings;
use crate::stats::{GroupStat, NeuronStatistics, PoolStat, ReservoirStat, StatSummary};
use crate::synapse::{Synapse, SynapseSource};
use crate::topology::{self, PoolLayout};
use rescomp_math::{BasicStat, Float};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One exported predictor: a neuron index and which of its two
/// predictor values to read. The list order fixes the output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorNeuron {
    /// Global index of the read neuron
    pub neuron: usize,
    /// Read the secondary (augmented) value instead of the primary
    pub use_secondary: bool,
}

/// A fixed, randomly wired recurrent network driven in discrete time
pub struct Reservoir {
    input_duration: usize,
    input_neurons: Vec<InputNeuron>,
    neurons: Vec<HiddenNeuron>,
    input_bank: Vec<Vec<Synapse>>,
    pool_bank: Vec<Vec<Synapse>>,
    pools: Vec<PoolLayout>,
    predictors: Vec<PredictorNeuron>,
    spectral_radius: Option<Float>,
    input_weight_stats: Vec<BasicStat>,
    internal_weight_stats: Vec<BasicStat>,

    // Previous-cycle output snapshots; the phase barrier reads these
    input_outputs: Vec<Float>,
    hidden_outputs: Vec<Float>,
}

impl Reservoir {
    /// Build a reservoir from validated settings. Fails fast; no
    /// partially built instance is ever returned.
    pub fn new(settings: &ReservoirSettings) -> Result<Self> {
        let built = topology::build(settings)?;

        // Predictor order: ascending neuron index, primary first, then
        // the secondary value where the group enables augmentation
        let mut predictors = Vec::new();
        for (index, neuron) in built.neurons.iter().enumerate() {
            if !neuron.readout_eligible {
                continue;
            }
            predictors.push(PredictorNeuron {
                neuron: index,
                use_secondary: false,
            });
            if neuron.augmented_state {
                predictors.push(PredictorNeuron {
                    neuron: index,
                    use_secondary: true,
                });
            }
        }

        let input_outputs = vec![0.0; built.input_neurons.len()];
        let hidden_outputs = vec![0.0; built.neurons.len()];

        Ok(Self {
            input_duration: settings.input_duration,
            input_neurons: built.input_neurons,
            neurons: built.neurons,
            input_bank: built.input_bank,
            pool_bank: built.pool_bank,
            pools: built.pools,
            predictors,
            spectral_radius: built.spectral_radius,
            input_weight_stats: built.input_weight_stats,
            internal_weight_stats: built.internal_weight_stats,
            input_outputs,
            hidden_outputs,
        })
    }

    /// Number of reservoir neurons
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of synapses, input and internal combined
    pub fn synapse_count(&self) -> usize {
        self.input_bank.iter().map(Vec::len).sum::<usize>()
            + self.pool_bank.iter().map(Vec::len).sum::<usize>()
    }

    /// Number of input fields the reservoir consumes per `compute`
    pub fn num_input_fields(&self) -> usize {
        self.input_neurons.len()
    }

    /// Number of values `copy_predictors_to` writes
    pub fn num_predictors(&self) -> usize {
        self.predictors.len()
    }

    /// Exported predictors in output-buffer order
    pub fn predictors(&self) -> &[PredictorNeuron] {
        &self.predictors
    }

    /// Structural pool layouts
    pub fn pools(&self) -> &[PoolLayout] {
        &self.pools
    }

    /// Inbound input-field synapses of one neuron
    pub fn input_synapses(&self, neuron: usize) -> &[Synapse] {
        &self.input_bank[neuron]
    }

    /// Inbound reservoir synapses of one neuron
    pub fn internal_synapses(&self, neuron: usize) -> &[Synapse] {
        &self.pool_bank[neuron]
    }

    /// The neuron arena, in global-index order
    pub fn neurons(&self) -> &[HiddenNeuron] {
        &self.neurons
    }

    /// Target spectral radius applied at construction, if any
    pub fn spectral_radius(&self) -> Option<Float> {
        self.spectral_radius
    }

    /// Micro-cycles executed per `compute` call
    pub fn input_duration(&self) -> usize {
        self.input_duration
    }

    /// Advance the reservoir by one macro step: push the encoder state
    /// into the input neurons and run `input_duration` micro-cycles.
    pub fn compute(&mut self, input: &[Float], update_statistics: bool) -> Result<()> {
        if input.len() != self.input_neurons.len() {
            return Err(CoreError::InputLengthMismatch {
                expected: self.input_neurons.len(),
                got: input.len(),
            });
        }

        for (neuron, &value) in self.input_neurons.iter_mut().zip(input) {
            neuron.new_state(value);
        }
        for (snapshot, neuron) in self.input_outputs.iter_mut().zip(&self.input_neurons) {
            *snapshot = neuron.output();
        }

        for _ in 0..self.input_duration {
            self.gather_stimuli(update_statistics);
            self.advance_state(update_statistics);
        }
        Ok(())
    }

    /// Phase 1: every neuron collects its inbound signals, reading the
    /// previous cycle's output snapshots only
    fn gather_stimuli(&mut self, update_statistics: bool) {
        let input_outputs = &self.input_outputs;
        let hidden_outputs = &self.hidden_outputs;

        let gather = |neuron: &mut HiddenNeuron,
                      inputs: &mut Vec<Synapse>,
                      internals: &mut Vec<Synapse>| {
            let mut external = 0.0;
            for synapse in inputs.iter_mut() {
                let source = source_output(synapse, input_outputs, hidden_outputs);
                external += synapse.get_signal(source, update_statistics);
            }
            let mut internal = 0.0;
            for synapse in internals.iter_mut() {
                let source = source_output(synapse, input_outputs, hidden_outputs);
                internal += synapse.get_signal(source, update_statistics);
            }
            neuron.new_stimuli(external, internal);
        };

        #[cfg(feature = "parallel")]
        {
            self.neurons
                .par_iter_mut()
                .zip(self.input_bank.par_iter_mut())
                .zip(self.pool_bank.par_iter_mut())
                .for_each(|((neuron, inputs), internals)| gather(neuron, inputs, internals));
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.neurons
                .iter_mut()
                .zip(self.input_bank.iter_mut())
                .zip(self.pool_bank.iter_mut())
                .for_each(|((neuron, inputs), internals)| gather(neuron, inputs, internals));
        }
    }

    /// Phase 2: every neuron advances its activation; afterwards the
    /// output snapshot is refreshed for the next cycle
    fn advance_state(&mut self, update_statistics: bool) {
        #[cfg(feature = "parallel")]
        {
            self.neurons
                .par_iter_mut()
                .for_each(|neuron| neuron.new_state(update_statistics));
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.neurons
                .iter_mut()
                .for_each(|neuron| neuron.new_state(update_statistics));
        }

        for (snapshot, neuron) in self.hidden_outputs.iter_mut().zip(&self.neurons) {
            *snapshot = neuron.output();
        }
    }

    /// Write every predictor value into `buffer` starting at `offset`,
    /// in predictor creation order. Returns the number of values
    /// written, always `num_predictors()`.
    pub fn copy_predictors_to(&self, buffer: &mut [Float], offset: usize) -> Result<usize> {
        let needed = self.predictors.len();
        let available = buffer.len().saturating_sub(offset);
        if available < needed {
            return Err(CoreError::BufferTooSmall {
                needed,
                offset,
                available,
            });
        }

        for (slot, predictor) in buffer[offset..offset + needed]
            .iter_mut()
            .zip(&self.predictors)
        {
            let neuron = &self.neurons[predictor.neuron];
            *slot = if predictor.use_secondary {
                neuron.secondary_predictor()
            } else {
                neuron.primary_predictor()
            };
        }
        Ok(needed)
    }

    /// Restore the freshly constructed dynamic state without touching
    /// structure; statistics are cleared only when requested
    pub fn reset(&mut self, reset_statistics: bool) {
        for neuron in &mut self.input_neurons {
            neuron.reset();
        }

        #[cfg(feature = "parallel")]
        {
            self.neurons
                .par_iter_mut()
                .for_each(|neuron| neuron.reset(reset_statistics));
            self.input_bank
                .par_iter_mut()
                .chain(self.pool_bank.par_iter_mut())
                .flatten()
                .for_each(|synapse| synapse.reset(reset_statistics));
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.neurons
                .iter_mut()
                .for_each(|neuron| neuron.reset(reset_statistics));
            self.input_bank
                .iter_mut()
                .chain(self.pool_bank.iter_mut())
                .flatten()
                .for_each(|synapse| synapse.reset(reset_statistics));
        }

        self.input_outputs.iter_mut().for_each(|v| *v = 0.0);
        self.hidden_outputs.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Aggregate the recorded statistics into a per-pool, per-group
    /// snapshot. Tuning use only; never required for correctness.
    pub fn collect_statistics(&self) -> ReservoirStat {
        let mut pool_stats = Vec::with_capacity(self.pools.len());

        for (pool_index, layout) in self.pools.iter().enumerate() {
            let mut groups: Vec<(usize, NeuronStatistics)> = layout
                .group_names
                .iter()
                .map(|_| (0, NeuronStatistics::new()))
                .collect();

            let mut efficacy = BasicStat::new();
            for global in layout.range() {
                let neuron = &self.neurons[global];
                let (count, merged) = &mut groups[neuron.group_index];
                *count += 1;
                let stats = neuron.statistics();
                merged.total_stimulus.merge(&stats.total_stimulus);
                merged.activation.merge(&stats.activation);
                merged.output.merge(&stats.output);
                merged.spike_count += stats.spike_count;

                for synapse in self.input_bank[global].iter().chain(&self.pool_bank[global]) {
                    if synapse.is_dynamic() {
                        efficacy.merge(synapse.efficacy_statistics());
                    }
                }
            }

            let group_stats = layout
                .group_names
                .iter()
                .zip(&groups)
                .map(|(name, (count, merged))| GroupStat {
                    name: name.clone(),
                    neuron_count: *count,
                    total_stimulus: StatSummary::from(&merged.total_stimulus),
                    activation: StatSummary::from(&merged.activation),
                    output: StatSummary::from(&merged.output),
                    spike_count: merged.spike_count,
                })
                .collect();

            pool_stats.push(PoolStat {
                name: layout.name.clone(),
                neuron_count: layout.grid.size(),
                groups: group_stats,
                input_weights: StatSummary::from(&self.input_weight_stats[pool_index]),
                internal_weights: StatSummary::from(&self.internal_weight_stats[pool_index]),
                synapse_efficacy: StatSummary::from(&efficacy),
            });
        }

        ReservoirStat {
            neuron_count: self.neurons.len(),
            synapse_count: self.synapse_count(),
            spectral_radius: self.spectral_radius,
            pools: pool_stats,
        }
    }
}

fn source_output(
    synapse: &Synapse,
    input_outputs: &[Float],
    hidden_outputs: &[Float],
) -> Float {
    match synapse.source {
        SynapseSource::Input(field) => input_outputs[field],
        SynapseSource::Hidden(index) => hidden_outputs[index],
    }
}
