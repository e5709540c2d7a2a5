use rand::SeedableRng;
use rand::rngs::StdRng;
use safetysim_core::SimError;
use safetysim_core::scaling::{
    CapPolicy, ComputeGrid, GridConfig, ScalingConfig, ScalingLaw, is_non_increasing,
    simulate_scaling,
};

fn small_config() -> ScalingConfig {
    ScalingConfig {
        num_simulations: 300,
        ..ScalingConfig::default()
    }
}

#[test]
fn loss_is_exactly_one_at_reference_point() {
    let law = ScalingLaw::new(1e20).expect("law");
    assert_eq!(law.loss(1e20, 0.05), 1.0);
}

#[test]
fn aggregate_band_ordering_holds_on_full_grid() {
    let run = simulate_scaling(&small_config(), &mut StdRng::seed_from_u64(42)).expect("run");
    let aggregate = &run.aggregate;
    assert_eq!(aggregate.len(), run.grid.len());
    for ((lower, median), upper) in aggregate
        .lower
        .iter()
        .zip(&aggregate.median)
        .zip(&aggregate.upper)
    {
        assert!(lower <= median && median <= upper);
    }
    assert!(is_non_increasing(&aggregate.median));
}

#[test]
fn regulated_curve_is_prefix_then_constant() {
    let run = simulate_scaling(&small_config(), &mut StdRng::seed_from_u64(7)).expect("run");
    let idx = run.regulated.cap_index;
    let median = &run.aggregate.median;

    assert!(run.grid.values()[idx] >= run.compute_cap());
    assert!(idx == 0 || run.grid.values()[idx - 1] < run.compute_cap());
    assert_eq!(&run.regulated.values[..idx], &median[..idx]);
    assert!(run.regulated.values[idx..].iter().all(|v| *v == median[idx]));
}

#[test]
fn seeded_scaling_runs_are_bit_identical() {
    let config = small_config();
    let a = simulate_scaling(&config, &mut StdRng::seed_from_u64(1234)).expect("run a");
    let b = simulate_scaling(&config, &mut StdRng::seed_from_u64(1234)).expect("run b");
    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.aggregate.median), bits(&b.aggregate.median));
    assert_eq!(bits(&a.aggregate.lower), bits(&b.aggregate.lower));
    assert_eq!(bits(&a.aggregate.upper), bits(&b.aggregate.upper));
    assert_eq!(bits(&a.regulated.values), bits(&b.regulated.values));
}

#[test]
fn cap_outside_grid_fails_out_of_range() {
    let grid = GridConfig::default().build().expect("grid");
    let median = ScalingLaw::default().loss_curve(&grid, 0.05);
    let below = CapPolicy::new(grid.min() / 2.0).expect("policy");
    let above = CapPolicy::new(grid.max() * 2.0).expect("policy");
    assert!(matches!(
        below.apply(&median, &grid),
        Err(SimError::CapOutOfRange { .. })
    ));
    assert!(matches!(
        above.cap_index(&grid),
        Err(SimError::CapOutOfRange { .. })
    ));
}

#[test]
fn custom_grid_and_band_flow_through() {
    let config = ScalingConfig {
        grid: GridConfig {
            start_exp: 20.0,
            end_exp: 24.0,
            points: 9,
        },
        compute_cap: 1e22,
        num_simulations: 100,
        ..ScalingConfig::default()
    };
    let run = simulate_scaling(&config, &mut StdRng::seed_from_u64(3)).expect("run");
    assert_eq!(run.grid, ComputeGrid::logspace(20.0, 24.0, 9).expect("grid"));
    assert_eq!(run.regulated.cap_index, 4);
    assert_eq!(run.aggregate.band.lower, 5.0);
    assert_eq!(run.aggregate.band.upper, 95.0);
}
