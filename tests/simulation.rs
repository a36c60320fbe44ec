use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use trialpower::{empirical_power, solve, PowerQuery, SimulationConfig};

#[test]
fn seeded_runs_are_bit_identical() {
    let config = SimulationConfig {
        num_runs: 2000,
        seed: Some(123_456),
        ..SimulationConfig::default()
    };
    let first = empirical_power(0.5, 30, 0.05, &config).unwrap();
    let second = empirical_power(0.5, 30, 0.05, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.empirical_power.to_bits(),
        second.empirical_power.to_bits()
    );
}

#[test]
fn empirical_power_tracks_the_analytic_value() {
    // 5000 runs put the standard error near 0.0057, so 0.03 is over 5 SE.
    let config = SimulationConfig {
        num_runs: 5000,
        seed: Some(123_456),
        ..SimulationConfig::default()
    };
    let summary = empirical_power(0.5, 64, 0.05, &config).unwrap();
    assert_abs_diff_eq!(summary.empirical_power, 0.80, epsilon = 0.03);

    let analytic = solve(&PowerQuery::for_power(0.5, 64)).unwrap().power;
    assert_abs_diff_eq!(summary.empirical_power, analytic, epsilon = 0.03);
}

#[test]
fn null_effect_rejects_at_alpha() {
    // d = 0 is allowed in the simulator: it measures the type I error rate.
    let config = SimulationConfig {
        num_runs: 5000,
        seed: Some(99),
        ..SimulationConfig::default()
    };
    let summary = empirical_power(0.0, 40, 0.05, &config).unwrap();
    assert_abs_diff_eq!(summary.empirical_power, 0.05, epsilon = 0.02);
}

#[test]
fn pooled_test_agrees_with_welch_under_equal_variances() {
    // Equal group sizes and unit variances on both arms: the two test forms
    // target the same power, so the estimates should land close together.
    let welch = empirical_power(
        0.5,
        64,
        0.05,
        &SimulationConfig {
            num_runs: 5000,
            seed: Some(2024),
            equal_variance: false,
        },
    )
    .unwrap();
    let pooled = empirical_power(
        0.5,
        64,
        0.05,
        &SimulationConfig {
            num_runs: 5000,
            seed: Some(2024),
            equal_variance: true,
        },
    )
    .unwrap();
    assert_abs_diff_eq!(welch.empirical_power, pooled.empirical_power, epsilon = 0.03);
    assert_abs_diff_eq!(pooled.empirical_power, 0.80, epsilon = 0.03);
}

#[test]
fn larger_effects_reject_more_often() {
    let config = SimulationConfig {
        num_runs: 3000,
        seed: Some(7),
        ..SimulationConfig::default()
    };
    let small = empirical_power(0.2, 30, 0.05, &config).unwrap();
    let large = empirical_power(0.8, 30, 0.05, &config).unwrap();
    assert!(large.empirical_power > small.empirical_power);
}

#[test]
fn no_skips_with_continuous_draws() {
    let config = SimulationConfig {
        num_runs: 1000,
        seed: Some(5),
        ..SimulationConfig::default()
    };
    let summary = empirical_power(0.5, 10, 0.05, &config).unwrap();
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.runs, 1000);
}
