//! End-to-end reservoir construction and simulation checks

use proptest::prelude::*;
use rescomp_core::{
    estimate_dominant_eigenvalue, InputAssignment, InputFieldSettings, InterconnectSettings,
    Interval, NeuronGroupSettings, NeuronRole, OutputSignalType, PoolLinkSettings, PoolSettings,
    RandomDist, RetainmentSettings, Reservoir, ReservoirSettings, SignalConversion, Synapse,
    SynapseKind, SynapseSettings, SynapseSource, Tanh,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn analog_group(augmented: bool) -> NeuronGroupSettings {
    NeuronGroupSettings {
        name: "exc".into(),
        role: NeuronRole::Excitatory,
        relative_share: 1.0,
        activation: Tanh::factory(),
        bias: RandomDist::Uniform {
            min: -0.2,
            max: 0.2,
        },
        augmented_states: augmented,
    }
}

/// One pool of 10 excitatory analog neurons, density 0.3, no self
/// connections, target spectral radius 0.9, one fully connected
/// input field, 3 micro-cycles per step
fn scenario_settings(augmented: bool) -> ReservoirSettings {
    ReservoirSettings {
        seed: 11,
        input_duration: 3,
        spectral_radius: Some(0.9),
        pools: vec![PoolSettings {
            name: "main".into(),
            dim_x: 5,
            dim_y: 2,
            dim_z: 1,
            groups: vec![analog_group(augmented)],
            interconnect: InterconnectSettings {
                density: 0.3,
                avg_distance: 0.0,
                allow_self_connections: false,
                gaussian_fan_out: false,
                synapse: SynapseSettings::default(),
            },
            retainment: None,
            readout_density: 1.0,
        }],
        input_fields: vec![InputFieldSettings {
            name: "stimulus".into(),
            range: Interval::SYMMETRIC_UNIT,
            assignments: vec![InputAssignment {
                pool: 0,
                density: 1.0,
                synapse: SynapseSettings::default(),
            }],
        }],
        pool_links: vec![],
    }
}

#[test]
fn end_to_end_scenario() {
    init_logs();
    let mut reservoir = Reservoir::new(&scenario_settings(false)).unwrap();
    assert_eq!(reservoir.neuron_count(), 10);
    assert_eq!(reservoir.num_predictors(), 10);

    reservoir.compute(&[1.0], true).unwrap();

    let mut buffer = vec![0.0; 10];
    assert_eq!(reservoir.copy_predictors_to(&mut buffer, 0).unwrap(), 10);
    for (index, value) in buffer.iter().enumerate() {
        let range = reservoir.neurons()[index].output_range();
        assert!(
            range.contains(*value),
            "neuron {} output {} outside {:?}",
            index,
            value,
            range
        );
    }
}

#[test]
fn augmented_predictors_double_the_buffer() {
    let mut reservoir = Reservoir::new(&scenario_settings(true)).unwrap();
    assert_eq!(reservoir.num_predictors(), 20);

    reservoir.compute(&[1.0], false).unwrap();
    let mut buffer = vec![0.0; 20];
    assert_eq!(reservoir.copy_predictors_to(&mut buffer, 0).unwrap(), 20);
}

#[test]
fn spectral_radius_of_rescaled_matrix() {
    let reservoir = Reservoir::new(&scenario_settings(false)).unwrap();
    assert_eq!(reservoir.spectral_radius(), Some(0.9));

    let n = reservoir.neuron_count();
    let mut triplets = Vec::new();
    for target in 0..n {
        for synapse in reservoir.internal_synapses(target) {
            if let SynapseSource::Hidden(source) = synapse.source {
                triplets.push((target, source, synapse.weight()));
            }
        }
    }
    let matrix = rescomp_core::SparseMatrix::from_triplets(n, n, &triplets).unwrap();
    let eigenvalue = estimate_dominant_eigenvalue(&matrix).unwrap();
    assert!(
        eigenvalue <= 0.9 + 1e-2,
        "eigenvalue {} exceeds target",
        eigenvalue
    );
    assert!((eigenvalue - 0.9).abs() < 1e-2);
}

#[test]
fn wiring_invariants() {
    let reservoir = Reservoir::new(&scenario_settings(false)).unwrap();

    let mut internal = 0usize;
    for target in 0..reservoir.neuron_count() {
        let mut seen = std::collections::HashSet::new();
        for synapse in reservoir.internal_synapses(target) {
            assert_ne!(synapse.source, SynapseSource::Hidden(target));
            assert!(seen.insert(synapse.source), "duplicate (source, target)");
            internal += 1;
        }
        for synapse in reservoir.input_synapses(target) {
            assert_eq!(synapse.queue_capacity(), synapse.delay() + 1);
            // max_delay = 0 in the scenario
            assert_eq!(synapse.delay(), 0);
        }
    }
    // round(10^2 * 0.3) = 30
    assert_eq!(internal, 30);
}

#[test]
fn same_seed_reproduces_full_trace() {
    let inputs = [[1.0], [0.0], [-1.0], [0.5], [0.25]];

    let mut a = Reservoir::new(&scenario_settings(true)).unwrap();
    let mut b = Reservoir::new(&scenario_settings(true)).unwrap();

    for input in &inputs {
        a.compute(input, true).unwrap();
        b.compute(input, true).unwrap();
        let mut va = vec![0.0; a.num_predictors()];
        let mut vb = vec![0.0; b.num_predictors()];
        a.copy_predictors_to(&mut va, 0).unwrap();
        b.copy_predictors_to(&mut vb, 0).unwrap();
        assert_eq!(va, vb);
    }
}

#[test]
fn reset_matches_fresh_instance() {
    let inputs = [[1.0], [-0.5], [0.75]];

    let mut fresh = Reservoir::new(&scenario_settings(false)).unwrap();
    let mut reused = Reservoir::new(&scenario_settings(false)).unwrap();

    for _ in 0..5 {
        reused.compute(&[0.3], false).unwrap();
    }
    reused.reset(false);

    for input in &inputs {
        fresh.compute(input, false).unwrap();
        reused.compute(input, false).unwrap();
        let mut vf = vec![0.0; fresh.num_predictors()];
        let mut vr = vec![0.0; reused.num_predictors()];
        fresh.copy_predictors_to(&mut vf, 0).unwrap();
        reused.copy_predictors_to(&mut vr, 0).unwrap();
        assert_eq!(vf, vr);
    }
}

#[test]
fn two_pool_reservoir_with_dynamic_link() {
    let mut settings = scenario_settings(false);
    settings.pools.push(PoolSettings {
        name: "second".into(),
        dim_x: 2,
        dim_y: 2,
        dim_z: 2,
        groups: vec![analog_group(false)],
        interconnect: InterconnectSettings {
            density: 0.1,
            ..InterconnectSettings::default()
        },
        retainment: Some(RetainmentSettings {
            density: 1.0,
            rate: RandomDist::Uniform { min: 0.1, max: 0.5 },
        }),
        readout_density: 0.5,
    });
    settings.pool_links.push(PoolLinkSettings {
        source_pool: 0,
        target_pool: 1,
        source_density: 0.4,
        target_density: 0.75,
        gaussian_fan_in: false,
        synapse: SynapseSettings {
            kind: SynapseKind::Dynamic {
                resting_efficacy: 0.5,
                tau_facilitation: 20.0,
                tau_depression: 100.0,
            },
            weight: RandomDist::Uniform { min: 0.0, max: 0.5 },
            max_delay: 1,
        },
    });

    let mut reservoir = Reservoir::new(&settings).unwrap();
    assert_eq!(reservoir.neuron_count(), 18);
    // 10 from the main pool plus round(8 * 0.5) from the second
    assert_eq!(reservoir.num_predictors(), 14);

    for step in 0..10 {
        let value = if step % 2 == 0 { 1.0 } else { -1.0 };
        reservoir.compute(&[value], true).unwrap();
    }

    let stats = reservoir.collect_statistics();
    assert_eq!(stats.pools.len(), 2);
    let second = &stats.pools[1];
    // Dynamic efficacy samples were recorded and stayed in bounds
    assert!(second.synapse_efficacy.count > 0);
    assert!(second.synapse_efficacy.min >= 0.0);
    assert!(second.synapse_efficacy.max <= 1.0);
}

#[test]
fn overlapping_pool_links_never_duplicate_synapses() {
    let mut settings = scenario_settings(false);
    settings.pools.push(PoolSettings {
        name: "second".into(),
        dim_x: 2,
        dim_y: 2,
        dim_z: 2,
        groups: vec![analog_group(false)],
        interconnect: InterconnectSettings {
            density: 0.1,
            ..InterconnectSettings::default()
        },
        retainment: None,
        readout_density: 0.5,
    });
    let link = PoolLinkSettings {
        source_pool: 0,
        target_pool: 1,
        source_density: 1.0,
        target_density: 1.0,
        gaussian_fan_in: false,
        synapse: SynapseSettings::default(),
    };
    settings.pool_links.push(link.clone());
    settings.pool_links.push(link);

    let reservoir = Reservoir::new(&settings).unwrap();
    assert_eq!(reservoir.neuron_count(), 18);

    let mut cross = 0usize;
    for target in 10..18 {
        let mut seen = std::collections::HashSet::new();
        for synapse in reservoir.internal_synapses(target) {
            assert!(seen.insert(synapse.source), "duplicate (source, target)");
            if matches!(synapse.source, SynapseSource::Hidden(source) if source < 10) {
                cross += 1;
            }
        }
    }
    // The second link finds every (source, target) pair occupied, so
    // the cross-pool count stays at 8 targets x 10 sources
    assert_eq!(cross, 80);
}

#[test]
fn statistics_track_only_when_requested() {
    let mut reservoir = Reservoir::new(&scenario_settings(false)).unwrap();
    reservoir.compute(&[1.0], false).unwrap();
    let silent = reservoir.collect_statistics();
    assert_eq!(silent.pools[0].groups[0].output.count, 0);

    reservoir.compute(&[1.0], true).unwrap();
    let tracked = reservoir.collect_statistics();
    assert_eq!(tracked.pools[0].groups[0].output.count, 30);
}

proptest! {
    /// Dynamic efficacy never leaves [0, 1], whatever the source
    /// activity looks like
    #[test]
    fn dynamic_efficacy_bounded(
        signals in prop::collection::vec(-1.0f64..=1.0, 1..200),
        delay in 0usize..4,
        resting in 0.05f64..=1.0,
        tau_f in 1.0f64..200.0,
        tau_d in 1.0f64..200.0,
    ) {
        let conversion = SignalConversion::new(
            Interval::SYMMETRIC_UNIT,
            OutputSignalType::Spike,
            Interval::UNIT,
        );
        let kind = SynapseKind::Dynamic {
            resting_efficacy: resting,
            tau_facilitation: tau_f,
            tau_depression: tau_d,
        };
        let mut synapse = Synapse::new(
            SynapseSource::Hidden(0),
            1,
            1.0,
            delay,
            conversion,
            &kind,
        );

        for signal in signals {
            let delivered = synapse.get_signal(signal, true);
            // Converted signals are in [0, 1]; a unit weight and a
            // bounded efficacy keep deliveries there too
            prop_assert!((0.0..=1.0).contains(&delivered));
        }
        let stats = synapse.efficacy_statistics();
        prop_assert!(stats.min() >= 0.0);
        prop_assert!(stats.max() <= 1.0);
    }
}
