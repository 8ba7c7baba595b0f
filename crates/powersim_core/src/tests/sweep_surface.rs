//! Power surface shape checks
//!
//! Single cells are noisy, so monotonicity is checked on surfaces averaged
//! over several independent sweeps.

use crate::config::PowerConfig;
use crate::sweep::sweep_power;

const SAMPLE_SIZES: [usize; 5] = [10, 20, 30, 40, 50];
const EFFECT_SIZES: [f64; 8] = [0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

fn averaged_surface(runs: u64) -> Vec<Vec<f64>> {
    let config = PowerConfig::default().with_sims(2_000);
    let mut sum = vec![vec![0.0; SAMPLE_SIZES.len()]; EFFECT_SIZES.len()];
    for seed in 0..runs {
        let surface = sweep_power(&SAMPLE_SIZES, &EFFECT_SIZES, &config, seed, None).unwrap();
        for (row, values) in surface.to_matrix().into_iter().enumerate() {
            for (col, p) in values.into_iter().enumerate() {
                sum[row][col] += p / runs as f64;
            }
        }
    }
    sum
}

#[test]
fn test_averaged_surface_is_monotone() {
    let avg = averaged_surface(4);
    let tolerance = 0.01;

    for row in &avg {
        for pair in row.windows(2) {
            assert!(pair[1] >= pair[0] - tolerance, "sample-size axis dipped: {row:?}");
        }
    }
    for col in 0..SAMPLE_SIZES.len() {
        for row in 1..EFFECT_SIZES.len() {
            assert!(
                avg[row][col] >= avg[row - 1][col] - tolerance,
                "effect-size axis dipped at column {col}"
            );
        }
    }

    // Corners: smallest design near alpha, largest near certain.
    assert!(avg[0][0] < 0.15);
    assert!(avg[EFFECT_SIZES.len() - 1][SAMPLE_SIZES.len() - 1] > 0.95);
}

#[test]
fn test_min_sample_size_shrinks_with_effect() {
    let config = PowerConfig::default().with_sims(2_000);
    let sizes: Vec<usize> = (10..=60).step_by(5).collect();
    let surface = sweep_power(&sizes, &[0.6, 1.0], &config, 17, None).unwrap();
    let medium = surface.min_sample_size_for(0, 0.8).unwrap();
    let large = surface.min_sample_size_for(1, 0.8).unwrap();
    assert!(large < medium);
}
