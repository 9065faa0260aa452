//! Deterministic reservoir topology construction
//!
//! Everything structural is created here, in one pass, from a single
//! seeded random stream: neuron parameter sets, spatial placement,
//! readout eligibility, input wiring, quadrant-budgeted intra-pool
//! wiring, pool-to-pool links, and the final spectral-radius rescale.
//! The draw order is fixed, so the same seed and settings always yield
//! the same reservoir. Construction is single-threaded; only the
//! simulation loop is parallel.

use crate::activation::OutputSignalType;
use crate::error::{CoreError, Result};
use crate::geometry::{delay_for_distance, euclidean_distance, NeuronPlacement, PoolGrid};
use crate::neuron::{HiddenNeuron, InputNeuron, NeuronRole};
use crate::settings::{InterconnectSettings, ReservoirSettings};
use crate::synapse::{SignalConversion, Synapse, SynapseSource};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rescomp_math::{estimate_dominant_eigenvalue, BasicStat, Float, SparseMatrix};
use std::collections::HashSet;

/// Budget shares of the four role quadrants, in wiring order
/// (E→E, E→I, I→E, I→I)
const QUADRANT_SHARES: [(NeuronRole, NeuronRole, Float); 4] = [
    (NeuronRole::Excitatory, NeuronRole::Excitatory, 0.3),
    (NeuronRole::Excitatory, NeuronRole::Inhibitory, 0.2),
    (NeuronRole::Inhibitory, NeuronRole::Excitatory, 0.4),
    (NeuronRole::Inhibitory, NeuronRole::Inhibitory, 0.1),
];

/// Structural identity of one pool inside the built reservoir
#[derive(Debug, Clone)]
pub struct PoolLayout {
    /// Pool name
    pub name: String,
    /// Grid geometry
    pub grid: PoolGrid,
    /// Global index of the pool's first neuron
    pub start: usize,
    /// Neuron-group names, by group index
    pub group_names: Vec<String>,
}

impl PoolLayout {
    /// Global index range of the pool's neurons
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.grid.size()
    }
}

/// Everything the builder hands to the reservoir
pub(crate) struct BuiltReservoir {
    pub input_neurons: Vec<InputNeuron>,
    pub neurons: Vec<HiddenNeuron>,
    /// Inbound input-field synapses, indexed by target global index
    pub input_bank: Vec<Vec<Synapse>>,
    /// Inbound reservoir synapses, indexed by target global index
    pub pool_bank: Vec<Vec<Synapse>>,
    pub pools: Vec<PoolLayout>,
    /// Target spectral radius actually applied, if any
    pub spectral_radius: Option<Float>,
    /// Per-pool input-synapse weight aggregate
    pub input_weight_stats: Vec<BasicStat>,
    /// Per-pool reservoir-synapse weight aggregate (post-rescale)
    pub internal_weight_stats: Vec<BasicStat>,
}

/// Build the full reservoir structure from validated settings
pub(crate) fn build(settings: &ReservoirSettings) -> Result<BuiltReservoir> {
    settings.validate()?;
    let mut rng = settings.create_rng();

    let total = settings.total_size();
    let mut neurons: Vec<HiddenNeuron> = Vec::with_capacity(total);
    let mut pools: Vec<PoolLayout> = Vec::with_capacity(settings.pools.len());

    for pool in &settings.pools {
        let start = neurons.len();
        let grid = PoolGrid {
            dim_x: pool.dim_x,
            dim_y: pool.dim_y,
            dim_z: pool.dim_z,
        };
        create_pool_neurons(pool, grid, start, pools.len(), &mut neurons, &mut rng)?;
        pools.push(PoolLayout {
            name: pool.name.clone(),
            grid,
            start,
            group_names: pool.groups.iter().map(|g| g.name.clone()).collect(),
        });
    }

    let mut input_bank: Vec<Vec<Synapse>> = (0..total).map(|_| Vec::new()).collect();
    let mut pool_bank: Vec<Vec<Synapse>> = (0..total).map(|_| Vec::new()).collect();
    let mut occupied: Vec<HashSet<SynapseSource>> = (0..total).map(|_| HashSet::new()).collect();

    let input_neurons = wire_inputs(
        settings,
        &pools,
        &neurons,
        &mut input_bank,
        &mut occupied,
        &mut rng,
    );

    for (pool_index, pool) in settings.pools.iter().enumerate() {
        wire_pool_interconnect(
            &pool.interconnect,
            &pools[pool_index],
            &neurons,
            &mut pool_bank,
            &mut occupied,
            &mut rng,
        )?;
    }

    for link in &settings.pool_links {
        wire_pool_link(link, &pools, &neurons, &mut pool_bank, &mut occupied, &mut rng)?;
    }

    let spectral_radius = match settings.spectral_radius {
        Some(target) => {
            apply_spectral_radius(target, &neurons, &mut pool_bank)?;
            Some(target)
        }
        None => None,
    };

    let (input_weight_stats, internal_weight_stats) =
        collect_weight_stats(&neurons, &input_bank, &pool_bank, pools.len());

    let synapse_count: usize = input_bank.iter().map(Vec::len).sum::<usize>()
        + pool_bank.iter().map(Vec::len).sum::<usize>();
    info!(
        "reservoir built: {} pools, {} neurons, {} synapses, spectral radius {:?}",
        pools.len(),
        neurons.len(),
        synapse_count,
        spectral_radius,
    );

    Ok(BuiltReservoir {
        input_neurons,
        neurons,
        input_bank,
        pool_bank,
        pools,
        spectral_radius,
        input_weight_stats,
        internal_weight_stats,
    })
}

/// Per-slot construction parameters, shuffled before spatial assignment
struct SlotParams {
    group_index: usize,
    role: NeuronRole,
    activation: Box<dyn crate::activation::Activation>,
    bias: Float,
    retainment_rate: Float,
    augmented: bool,
}

fn create_pool_neurons(
    pool: &crate::settings::PoolSettings,
    grid: PoolGrid,
    start: usize,
    pool_index: usize,
    neurons: &mut Vec<HiddenNeuron>,
    rng: &mut StdRng,
) -> Result<()> {
    let size = grid.size();
    let shares: Vec<Float> = pool.groups.iter().map(|g| g.relative_share).collect();
    let counts = apportion(size, &shares);

    // One parameter set per slot, groups in settings order
    let mut params: Vec<SlotParams> = Vec::with_capacity(size);
    for (group_index, (group, &count)) in pool.groups.iter().zip(&counts).enumerate() {
        for _ in 0..count {
            params.push(SlotParams {
                group_index,
                role: group.role,
                activation: group.activation.create(),
                bias: group.bias.sample(rng),
                retainment_rate: 0.0,
                augmented: group.augmented_states,
            });
        }
    }

    if let Some(retainment) = &pool.retainment {
        let analog: Vec<usize> = params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.activation.output_type() == OutputSignalType::Analog)
            .map(|(i, _)| i)
            .collect();
        let count = round_count(analog.len(), retainment.density);
        for chosen in index::sample(rng, analog.len(), count).into_iter() {
            let rate = retainment.rate.sample(rng).clamp(0.0, 1.0 - Float::EPSILON);
            params[analog[chosen]].retainment_rate = rate;
        }
    }

    // Shuffling decorrelates spatial position from role/bias while the
    // raster assignment keeps group composition exact
    params.shuffle(rng);

    for (flat, param) in params.into_iter().enumerate() {
        let (x, y, z) = grid.coordinates_of(flat);
        let placement = NeuronPlacement {
            pool_index,
            reservoir_index: start + flat,
            pool_flat_index: flat,
            x,
            y,
            z,
        };
        neurons.push(HiddenNeuron::new(
            placement,
            param.role,
            param.group_index,
            param.activation,
            param.bias,
            param.retainment_rate,
            param.augmented,
        ));
    }

    let readout = round_count(size, pool.readout_density);
    for chosen in index::sample(rng, size, readout).into_iter() {
        neurons[start + chosen].readout_eligible = true;
    }

    debug!(
        "pool '{}': {} neurons, group counts {:?}, {} readout-eligible",
        pool.name, size, counts, readout,
    );
    Ok(())
}

fn wire_inputs(
    settings: &ReservoirSettings,
    pools: &[PoolLayout],
    neurons: &[HiddenNeuron],
    input_bank: &mut [Vec<Synapse>],
    occupied: &mut [HashSet<SynapseSource>],
    rng: &mut StdRng,
) -> Vec<InputNeuron> {
    let mut input_neurons = Vec::with_capacity(settings.input_fields.len());

    for (field_index, field) in settings.input_fields.iter().enumerate() {
        input_neurons.push(InputNeuron::new(field_index, field.range));
        let source = SynapseSource::Input(field_index);

        for assignment in &field.assignments {
            let layout = &pools[assignment.pool];
            let size = layout.grid.size();
            let count = round_count(size, assignment.density);

            let mut targets: Vec<usize> = index::sample(rng, size, count).into_vec();
            targets.sort_unstable();

            let center = layout.grid.center();
            let max_distance = layout.grid.max_distance();
            let mut created = 0usize;

            for flat in targets {
                let global = layout.start + flat;
                if !occupied[global].insert(source) {
                    continue;
                }
                let neuron = &neurons[global];
                let weight = assignment.synapse.weight.sample(rng);
                let distance = euclidean_distance(&center, &neuron.placement.coordinates());
                let delay =
                    delay_for_distance(distance, max_distance, assignment.synapse.max_delay);
                let conversion = SignalConversion::new(
                    field.range,
                    neuron.output_type(),
                    neuron.output_range(),
                );
                input_bank[global].push(Synapse::new(
                    source,
                    global,
                    weight,
                    delay,
                    conversion,
                    &assignment.synapse.kind,
                ));
                created += 1;
            }

            debug!(
                "input field '{}' -> pool '{}': {} synapses",
                field.name, layout.name, created,
            );
        }
    }

    input_neurons
}

/// Split a total connection budget across the feasible role quadrants.
///
/// Infeasible quadrants (an empty source or target side, or zero pair
/// capacity) get nothing; their shares are redistributed. The quadrant
/// with the largest budget absorbs the rounding residue so the total
/// is met exactly.
fn quadrant_budgets(total: usize, feasible: &[bool; 4]) -> [usize; 4] {
    let share_sum: Float = QUADRANT_SHARES
        .iter()
        .zip(feasible)
        .filter(|(_, &f)| f)
        .map(|((_, _, share), _)| share)
        .sum();

    let mut budgets = [0usize; 4];
    if total == 0 || share_sum <= 0.0 {
        return budgets;
    }

    for (i, (_, _, share)) in QUADRANT_SHARES.iter().enumerate() {
        if feasible[i] {
            budgets[i] = ((total as Float) * share / share_sum).round() as usize;
        }
    }

    let assigned: usize = budgets.iter().sum();
    let largest = (0..4)
        .filter(|&i| feasible[i])
        .max_by_key(|&i| budgets[i])
        .unwrap_or(0);
    budgets[largest] = (budgets[largest] as isize + total as isize - assigned as isize) as usize;
    budgets
}

fn wire_pool_interconnect(
    interconnect: &InterconnectSettings,
    layout: &PoolLayout,
    neurons: &[HiddenNeuron],
    pool_bank: &mut [Vec<Synapse>],
    occupied: &mut [HashSet<SynapseSource>],
    rng: &mut StdRng,
) -> Result<()> {
    let size = layout.grid.size();
    let budget = round_count(size * size, interconnect.density);
    if budget == 0 {
        return Ok(());
    }

    let flat_of_role = |role: NeuronRole| -> Vec<usize> {
        layout
            .range()
            .filter(|&g| neurons[g].role == role)
            .map(|g| g - layout.start)
            .collect()
    };
    let excitatory = flat_of_role(NeuronRole::Excitatory);
    let inhibitory = flat_of_role(NeuronRole::Inhibitory);

    let mut feasible = [false; 4];
    for (i, f) in feasible.iter_mut().enumerate() {
        let (src_role, tgt_role, _) = QUADRANT_SHARES[i];
        let sources = role_side(&excitatory, &inhibitory, src_role).len();
        let targets = role_side(&excitatory, &inhibitory, tgt_role).len();
        let self_pairs = if src_role == tgt_role && !interconnect.allow_self_connections {
            sources
        } else {
            0
        };
        *f = (sources * targets).saturating_sub(self_pairs) > 0;
    }
    if !feasible.iter().any(|&f| f) {
        return Err(CoreError::topology(format!(
            "pool '{}': interconnect budget {} but no connectable neuron pair exists",
            layout.name, budget,
        )));
    }

    let budgets = quadrant_budgets(budget, &feasible);
    debug!(
        "pool '{}': interconnect budget {} split E->E {} E->I {} I->E {} I->I {}",
        layout.name, budget, budgets[0], budgets[1], budgets[2], budgets[3],
    );

    for (i, &(src_role, tgt_role, _)) in QUADRANT_SHARES.iter().enumerate() {
        if budgets[i] == 0 {
            continue;
        }
        wire_quadrant(
            interconnect,
            layout,
            neurons,
            role_side(&excitatory, &inhibitory, src_role),
            role_side(&excitatory, &inhibitory, tgt_role),
            src_role == tgt_role,
            budgets[i],
            pool_bank,
            occupied,
            rng,
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn wire_quadrant(
    interconnect: &InterconnectSettings,
    layout: &PoolLayout,
    neurons: &[HiddenNeuron],
    sources: &[usize],
    targets: &[usize],
    same_role: bool,
    budget: usize,
    pool_bank: &mut [Vec<Synapse>],
    occupied: &mut [HashSet<SynapseSource>],
    rng: &mut StdRng,
) -> Result<()> {
    let average = budget as Float / sources.len() as Float;
    let cap = |_source: usize| -> usize {
        let self_slot = if same_role && !interconnect.allow_self_connections {
            1
        } else {
            0
        };
        targets.len() - self_slot
    };

    // Planned per-source out-degrees
    let mut degrees: Vec<usize> = Vec::with_capacity(sources.len());
    let mut assigned = 0usize;
    for &source in sources {
        let planned = if interconnect.gaussian_fan_out {
            sample_normal(rng, average, average / 2.0).round().max(0.0) as usize
        } else {
            average as usize
        };
        let degree = planned.min(cap(source)).min(budget - assigned);
        degrees.push(degree);
        assigned += degree;
    }

    // Redistribute the residual to the lowest-degree unsaturated
    // sources until the budget is met exactly
    while assigned < budget {
        let candidate = sources
            .iter()
            .enumerate()
            .filter(|&(i, &s)| degrees[i] < cap(s))
            .min_by_key(|&(i, _)| degrees[i])
            .map(|(i, _)| i);
        match candidate {
            Some(i) => {
                degrees[i] += 1;
                assigned += 1;
            }
            None => {
                return Err(CoreError::topology(format!(
                    "pool '{}': all sources saturated with {} of {} connections placed",
                    layout.name, assigned, budget,
                )));
            }
        }
    }

    let max_distance = layout.grid.max_distance();
    for (&source, &degree) in sources.iter().zip(&degrees) {
        if degree == 0 {
            continue;
        }
        let source_global = layout.start + source;
        let source_neuron = &neurons[source_global];

        let mut eligible: Vec<usize> = targets
            .iter()
            .copied()
            .filter(|&t| {
                (interconnect.allow_self_connections || t != source)
                    && !occupied[layout.start + t].contains(&SynapseSource::Hidden(source_global))
            })
            .collect();

        for _ in 0..degree {
            let position = if interconnect.avg_distance > 0.0 {
                // Distance-biased targeting: draw a desired distance
                // and take the closest eligible match, first found
                let desired = sample_normal(
                    rng,
                    interconnect.avg_distance,
                    interconnect.avg_distance / 2.0,
                )
                .abs();
                let mut best = 0usize;
                let mut best_error = Float::INFINITY;
                for (pos, &t) in eligible.iter().enumerate() {
                    let distance = source_neuron
                        .placement
                        .distance_to(&neurons[layout.start + t].placement);
                    let error = (distance - desired).abs();
                    if error < best_error {
                        best_error = error;
                        best = pos;
                    }
                }
                best
            } else {
                rng.gen_range(0..eligible.len())
            };
            let target = eligible.swap_remove(position);
            let target_global = layout.start + target;
            let target_neuron = &neurons[target_global];

            let magnitude = interconnect.synapse.weight.sample(rng);
            let weight = signed_weight(source_neuron.role, magnitude);
            let distance = source_neuron.placement.distance_to(&target_neuron.placement);
            let delay =
                delay_for_distance(distance, max_distance, interconnect.synapse.max_delay);
            let conversion = SignalConversion::new(
                source_neuron.output_range(),
                target_neuron.output_type(),
                target_neuron.output_range(),
            );

            occupied[target_global].insert(SynapseSource::Hidden(source_global));
            pool_bank[target_global].push(Synapse::new(
                SynapseSource::Hidden(source_global),
                target_global,
                weight,
                delay,
                conversion,
                &interconnect.synapse.kind,
            ));
        }
    }
    Ok(())
}

fn wire_pool_link(
    link: &crate::settings::PoolLinkSettings,
    pools: &[PoolLayout],
    neurons: &[HiddenNeuron],
    pool_bank: &mut [Vec<Synapse>],
    occupied: &mut [HashSet<SynapseSource>],
    rng: &mut StdRng,
) -> Result<()> {
    let source_layout = &pools[link.source_pool];
    let target_layout = &pools[link.target_pool];
    let source_size = source_layout.grid.size();
    let target_size = target_layout.grid.size();

    let target_count = round_count(target_size, link.target_density);
    let mut targets: Vec<usize> = index::sample(rng, target_size, target_count).into_vec();
    targets.sort_unstable();

    let average_fan_in = round_count(source_size, link.source_density);
    let center = target_layout.grid.center();
    let max_distance = target_layout.grid.max_distance();
    let mut created = 0usize;

    for flat in targets {
        let target_global = target_layout.start + flat;
        let target_neuron = &neurons[target_global];

        let fan_in = if link.gaussian_fan_in {
            let mean = average_fan_in as Float;
            sample_normal(rng, mean, mean / 2.0)
                .round()
                .clamp(0.0, source_size as Float) as usize
        } else {
            average_fan_in
        };

        let mut source_slots: Vec<usize> = index::sample(rng, source_size, fan_in).into_vec();
        source_slots.sort_unstable();

        for source_flat in source_slots {
            let source_global = source_layout.start + source_flat;
            if !occupied[target_global].insert(SynapseSource::Hidden(source_global)) {
                continue;
            }
            let source_neuron = &neurons[source_global];
            let magnitude = link.synapse.weight.sample(rng);
            let weight = signed_weight(source_neuron.role, magnitude);
            // Cross-pool grids share no coordinate frame; the link is
            // treated as entering at the target pool's center
            let distance =
                euclidean_distance(&center, &target_neuron.placement.coordinates());
            let delay = delay_for_distance(distance, max_distance, link.synapse.max_delay);
            let conversion = SignalConversion::new(
                source_neuron.output_range(),
                target_neuron.output_type(),
                target_neuron.output_range(),
            );
            pool_bank[target_global].push(Synapse::new(
                SynapseSource::Hidden(source_global),
                target_global,
                weight,
                delay,
                conversion,
                &link.synapse.kind,
            ));
            created += 1;
        }
    }

    debug!(
        "pool link '{}' -> '{}': {} synapses",
        source_layout.name, target_layout.name, created,
    );
    Ok(())
}

/// Whether a reservoir synapse stays inside one pool; only those take
/// part in spectral-radius normalization
fn is_pool_internal(neurons: &[HiddenNeuron], synapse: &Synapse) -> bool {
    match synapse.source {
        SynapseSource::Hidden(source) => {
            neurons[source].placement.pool_index == neurons[synapse.target].placement.pool_index
        }
        SynapseSource::Input(_) => false,
    }
}

fn apply_spectral_radius(
    target: Float,
    neurons: &[HiddenNeuron],
    pool_bank: &mut [Vec<Synapse>],
) -> Result<()> {
    let n = neurons.len();
    let mut triplets: Vec<(usize, usize, Float)> = Vec::new();
    for bank in pool_bank.iter() {
        for synapse in bank {
            if let SynapseSource::Hidden(source) = synapse.source {
                if is_pool_internal(neurons, synapse) {
                    triplets.push((synapse.target, source, synapse.weight()));
                }
            }
        }
    }

    let matrix = SparseMatrix::from_triplets(n, n, &triplets).map_err(CoreError::from)?;
    let eigenvalue = estimate_dominant_eigenvalue(&matrix).map_err(CoreError::from)?;
    if eigenvalue == 0.0 {
        return Err(CoreError::ZeroEigenvalue { target });
    }

    let factor = target / eigenvalue;
    for bank in pool_bank.iter_mut() {
        for synapse in bank.iter_mut() {
            if is_pool_internal(neurons, synapse) {
                synapse.scale_weight(factor);
            }
        }
    }

    info!(
        "spectral radius: estimated {:.6}, rescaled by {:.6} to target {}",
        eigenvalue, factor, target,
    );
    Ok(())
}

fn collect_weight_stats(
    neurons: &[HiddenNeuron],
    input_bank: &[Vec<Synapse>],
    pool_bank: &[Vec<Synapse>],
    pool_count: usize,
) -> (Vec<BasicStat>, Vec<BasicStat>) {
    let mut input_stats = vec![BasicStat::new(); pool_count];
    let mut internal_stats = vec![BasicStat::new(); pool_count];
    for (global, neuron) in neurons.iter().enumerate() {
        let pool = neuron.placement.pool_index;
        for synapse in &input_bank[global] {
            input_stats[pool].add_sample(synapse.weight());
        }
        for synapse in &pool_bank[global] {
            internal_stats[pool].add_sample(synapse.weight());
        }
    }
    (input_stats, internal_stats)
}

/// Largest-remainder apportionment of `total` slots among weighted
/// shares; every positive share receives its exact rounded quota and
/// the remainders are settled largest first
fn apportion(total: usize, shares: &[Float]) -> Vec<usize> {
    let share_sum: Float = shares.iter().sum();
    if total == 0 || share_sum <= 0.0 {
        return vec![0; shares.len()];
    }

    let quotas: Vec<Float> = shares
        .iter()
        .map(|s| total as Float * s / share_sum)
        .collect();
    let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let mut remaining = total - counts.iter().sum::<usize>();

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    for i in order {
        if remaining == 0 {
            break;
        }
        counts[i] += 1;
        remaining -= 1;
    }
    counts
}

fn role_side<'a>(
    excitatory: &'a [usize],
    inhibitory: &'a [usize],
    role: NeuronRole,
) -> &'a [usize] {
    match role {
        NeuronRole::Inhibitory => inhibitory,
        _ => excitatory,
    }
}

fn round_count(total: usize, density: Float) -> usize {
    ((total as Float * density).round() as usize).min(total)
}

fn signed_weight(role: NeuronRole, magnitude: Float) -> Float {
    match role.weight_sign() {
        Some(sign) => sign * magnitude.abs(),
        None => magnitude,
    }
}

fn sample_normal(rng: &mut StdRng, mean: Float, std_dev: Float) -> Float {
    if std_dev <= 0.0 {
        return mean;
    }
    Normal::new(mean, std_dev)
        .map(|n| n.sample(rng))
        .unwrap_or(mean)
}

/// Synapse settings helper shared by tests
#[cfg(test)]
pub(crate) fn static_synapse(max_delay: usize) -> crate::settings::SynapseSettings {
    crate::settings::SynapseSettings {
        max_delay,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{SpikingIf, Tanh};
    use crate::settings::{
        InputAssignment, InputFieldSettings, InterconnectSettings, NeuronGroupSettings,
        PoolSettings, RandomDist, ReservoirSettings,
    };
    use crate::activation::Interval;

    fn group(name: &str, role: NeuronRole, share: Float) -> NeuronGroupSettings {
        NeuronGroupSettings {
            name: name.into(),
            role,
            relative_share: share,
            activation: Tanh::factory(),
            bias: RandomDist::Uniform { min: -0.1, max: 0.1 },
            augmented_states: false,
        }
    }

    fn test_settings() -> ReservoirSettings {
        ReservoirSettings {
            seed: 42,
            input_duration: 1,
            spectral_radius: None,
            pools: vec![PoolSettings {
                name: "pool".into(),
                dim_x: 4,
                dim_y: 4,
                dim_z: 1,
                groups: vec![
                    group("exc", NeuronRole::Excitatory, 3.0),
                    group("inh", NeuronRole::Inhibitory, 1.0),
                ],
                interconnect: InterconnectSettings {
                    density: 0.2,
                    allow_self_connections: false,
                    ..InterconnectSettings::default()
                },
                retainment: None,
                readout_density: 0.5,
            }],
            input_fields: vec![InputFieldSettings {
                name: "f0".into(),
                range: Interval::SYMMETRIC_UNIT,
                assignments: vec![InputAssignment {
                    pool: 0,
                    density: 1.0,
                    synapse: static_synapse(2),
                }],
            }],
            pool_links: vec![],
        }
    }

    #[test]
    fn test_apportion_exact_and_remainders() {
        assert_eq!(apportion(10, &[1.0]), vec![10]);
        assert_eq!(apportion(10, &[3.0, 1.0]), vec![8, 2]);
        // Remainders settle largest first and sum exactly
        let counts = apportion(10, &[1.0, 1.0, 1.0]);
        assert_eq!(counts.iter().sum::<usize>(), 10);
        assert!(counts.iter().all(|&c| c == 3 || c == 4));
        assert_eq!(apportion(0, &[1.0, 2.0]), vec![0, 0]);
    }

    #[test]
    fn test_quadrant_budgets_all_feasible() {
        let budgets = quadrant_budgets(100, &[true; 4]);
        assert_eq!(budgets.iter().sum::<usize>(), 100);
        assert_eq!(budgets, [30, 20, 40, 10]);
    }

    #[test]
    fn test_quadrant_budgets_renormalize() {
        // Only E->E feasible: the whole budget lands there
        let budgets = quadrant_budgets(30, &[true, false, false, false]);
        assert_eq!(budgets, [30, 0, 0, 0]);

        // Mixed feasibility still sums exactly
        let budgets = quadrant_budgets(37, &[true, false, true, false]);
        assert_eq!(budgets.iter().sum::<usize>(), 37);
        assert_eq!(budgets[1] + budgets[3], 0);
    }

    #[test]
    fn test_group_composition_exact() {
        let built = build(&test_settings()).unwrap();
        let exc = built
            .neurons
            .iter()
            .filter(|n| n.role == NeuronRole::Excitatory)
            .count();
        let inh = built
            .neurons
            .iter()
            .filter(|n| n.role == NeuronRole::Inhibitory)
            .count();
        assert_eq!(exc, 12);
        assert_eq!(inh, 4);
    }

    #[test]
    fn test_connection_budget_met() {
        let built = build(&test_settings()).unwrap();
        let internal: usize = built.pool_bank.iter().map(Vec::len).sum();
        // round(16^2 * 0.2) = 51
        assert_eq!(internal, 51);

        // The per-quadrant split is honored exactly, not just the total
        let mut counts = [0usize; 4];
        for bank in &built.pool_bank {
            for synapse in bank {
                if let SynapseSource::Hidden(source) = synapse.source {
                    let quadrant = match (
                        built.neurons[source].role,
                        built.neurons[synapse.target].role,
                    ) {
                        (NeuronRole::Excitatory, NeuronRole::Excitatory) => 0,
                        (NeuronRole::Excitatory, NeuronRole::Inhibitory) => 1,
                        (NeuronRole::Inhibitory, NeuronRole::Excitatory) => 2,
                        (NeuronRole::Inhibitory, NeuronRole::Inhibitory) => 3,
                        _ => unreachable!(),
                    };
                    counts[quadrant] += 1;
                }
            }
        }
        assert_eq!(counts, quadrant_budgets(51, &[true; 4]));

        let input: usize = built.input_bank.iter().map(Vec::len).sum();
        assert_eq!(input, 16);
    }

    #[test]
    fn test_no_self_connections_or_duplicates() {
        let built = build(&test_settings()).unwrap();
        for (target, bank) in built.pool_bank.iter().enumerate() {
            let mut seen = HashSet::new();
            for synapse in bank {
                assert_ne!(synapse.source, SynapseSource::Hidden(target));
                assert!(seen.insert(synapse.source));
                assert_eq!(synapse.target, target);
            }
        }
    }

    #[test]
    fn test_role_sign_on_weights() {
        let built = build(&test_settings()).unwrap();
        for bank in &built.pool_bank {
            for synapse in bank {
                if let SynapseSource::Hidden(source) = synapse.source {
                    match built.neurons[source].role {
                        NeuronRole::Excitatory => assert!(synapse.weight() >= 0.0),
                        NeuronRole::Inhibitory => assert!(synapse.weight() <= 0.0),
                        NeuronRole::Input => unreachable!(),
                    }
                }
            }
        }
    }

    #[test]
    fn test_delay_bounds() {
        let built = build(&test_settings()).unwrap();
        for bank in &built.input_bank {
            for synapse in bank {
                assert!(synapse.delay() <= 2);
                assert_eq!(synapse.queue_capacity(), synapse.delay() + 1);
            }
        }
    }

    #[test]
    fn test_same_seed_same_topology() {
        let a = build(&test_settings()).unwrap();
        let b = build(&test_settings()).unwrap();
        assert_eq!(a.neurons.len(), b.neurons.len());
        for (na, nb) in a.neurons.iter().zip(&b.neurons) {
            assert_eq!(na.placement, nb.placement);
            assert_eq!(na.role, nb.role);
            assert_eq!(na.bias(), nb.bias());
            assert_eq!(na.readout_eligible, nb.readout_eligible);
        }
        for (ba, bb) in a.pool_bank.iter().zip(&b.pool_bank) {
            assert_eq!(ba.len(), bb.len());
            for (sa, sb) in ba.iter().zip(bb) {
                assert_eq!(sa.source, sb.source);
                assert_eq!(sa.weight(), sb.weight());
                assert_eq!(sa.delay(), sb.delay());
            }
        }
    }

    #[test]
    fn test_spectral_radius_rescale() {
        let mut settings = test_settings();
        settings.spectral_radius = Some(0.9);
        let built = build(&settings).unwrap();
        assert_eq!(built.spectral_radius, Some(0.9));

        let n = built.neurons.len();
        let mut triplets = Vec::new();
        for bank in &built.pool_bank {
            for synapse in bank {
                if let SynapseSource::Hidden(source) = synapse.source {
                    triplets.push((synapse.target, source, synapse.weight()));
                }
            }
        }
        let matrix = SparseMatrix::from_triplets(n, n, &triplets).unwrap();
        let eigenvalue = estimate_dominant_eigenvalue(&matrix).unwrap();
        assert!((eigenvalue - 0.9).abs() < 1e-2);
    }

    #[test]
    fn test_zero_eigenvalue_fails() {
        let mut settings = test_settings();
        settings.spectral_radius = Some(0.9);
        // No internal wiring at all: the weight matrix is empty
        settings.pools[0].interconnect.density = 0.0;
        assert!(matches!(
            build(&settings),
            Err(CoreError::ZeroEigenvalue { .. })
        ));
    }

    #[test]
    fn test_readout_density() {
        let built = build(&test_settings()).unwrap();
        let eligible = built.neurons.iter().filter(|n| n.readout_eligible).count();
        assert_eq!(eligible, 8);
    }

    #[test]
    fn test_retainment_only_on_analog() {
        let mut settings = test_settings();
        settings.pools[0].groups = vec![
            NeuronGroupSettings {
                name: "analog".into(),
                role: NeuronRole::Excitatory,
                relative_share: 1.0,
                activation: Tanh::factory(),
                bias: RandomDist::Constant { value: 0.0 },
                augmented_states: false,
            },
            NeuronGroupSettings {
                name: "spiking".into(),
                role: NeuronRole::Excitatory,
                relative_share: 1.0,
                activation: SpikingIf::factory(),
                bias: RandomDist::Constant { value: 0.0 },
                augmented_states: false,
            },
        ];
        settings.pools[0].retainment = Some(crate::settings::RetainmentSettings {
            density: 1.0,
            rate: RandomDist::Constant { value: 0.5 },
        });
        let built = build(&settings).unwrap();

        for neuron in &built.neurons {
            match neuron.output_type() {
                OutputSignalType::Analog => assert_eq!(neuron.retainment_rate(), 0.5),
                OutputSignalType::Spike => assert_eq!(neuron.retainment_rate(), 0.0),
            }
        }
    }

    #[test]
    fn test_pool_link_wiring() {
        let mut settings = test_settings();
        settings.pools.push(PoolSettings {
            name: "second".into(),
            dim_x: 3,
            dim_y: 3,
            dim_z: 1,
            groups: vec![group("exc", NeuronRole::Excitatory, 1.0)],
            interconnect: InterconnectSettings {
                density: 0.1,
                ..InterconnectSettings::default()
            },
            retainment: None,
            readout_density: 0.0,
        });
        settings.pool_links.push(crate::settings::PoolLinkSettings {
            source_pool: 0,
            target_pool: 1,
            source_density: 0.5,
            target_density: 1.0,
            gaussian_fan_in: false,
            synapse: static_synapse(0),
        });
        let built = build(&settings).unwrap();

        let second = &built.pools[1];
        let cross: usize = second
            .range()
            .map(|g| {
                built.pool_bank[g]
                    .iter()
                    .filter(|s| match s.source {
                        SynapseSource::Hidden(src) => {
                            built.neurons[src].placement.pool_index == 0
                        }
                        _ => false,
                    })
                    .count()
            })
            .sum();
        // 9 targets, round(16 * 0.5) = 8 sources each
        assert_eq!(cross, 72);
    }
}
