//! Grid sweep over effect sizes and sample sizes
//!
//! Every (effect size, sample size) cell gets its own power estimate from a
//! fresh batch. Cells share no data, so with the `parallel` feature they are
//! fanned out across the rayon pool. Each cell seeds its own generator from
//! the sweep seed and its flat index, which keeps the surface identical
//! whatever order the cells finish in.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::PowerConfig;
use crate::error::{PowerError, Result};
use crate::estimator::estimate_power_seeded;
use crate::model::{DesignParameters, PowerEstimate, PowerSurface, grid_len};
use crate::progress::Progress;

/// Estimate power on the Cartesian grid `effect_sizes × sample_sizes`.
///
/// Rows follow `effect_sizes`, columns follow `sample_sizes`, both in the
/// order given. `progress` counts finished cells and can cancel the sweep.
pub fn sweep_power(
    sample_sizes: &[usize],
    effect_sizes: &[f64],
    config: &PowerConfig,
    seed: u64,
    progress: Option<&Progress>,
) -> Result<PowerSurface> {
    validate_grid(sample_sizes, effect_sizes)?;
    config.validate()?;

    let cols = sample_sizes.len();
    let total = grid_len(effect_sizes.len(), cols)
        .ok_or_else(|| PowerError::invalid("grid", f64::INFINITY, "cell count overflows"))?;
    if let Some(progress) = progress {
        progress.reset(total);
    }

    let evaluate = |index: usize| -> Result<PowerEstimate> {
        if progress.is_some_and(Progress::is_cancelled) {
            return Err(PowerError::Cancelled);
        }
        let effect_size = effect_sizes[index / cols];
        let n = sample_sizes[index % cols];
        let design = DesignParameters::two_sample(effect_size, n);
        let estimate = estimate_power_seeded(&design, config, cell_seed(seed, index))?;

        if let Some(progress) = progress {
            progress.increment();
        }
        tracing::debug!(effect_size, n, power = estimate.power, "sweep cell done");
        Ok(estimate)
    };

    #[cfg(feature = "parallel")]
    let cells: Result<Vec<PowerEstimate>> = (0..total).into_par_iter().map(evaluate).collect();

    #[cfg(not(feature = "parallel"))]
    let cells: Result<Vec<PowerEstimate>> = (0..total).map(evaluate).collect();

    let cells = cells?;
    PowerSurface::from_cells(effect_sizes.to_vec(), sample_sizes.to_vec(), cells)
        .ok_or_else(|| PowerError::invalid("grid", total as f64, "cell count mismatch"))
}

fn validate_grid(sample_sizes: &[usize], effect_sizes: &[f64]) -> Result<()> {
    if sample_sizes.is_empty() {
        return Err(PowerError::invalid("sample_sizes", 0.0, "grid axis is empty"));
    }
    if effect_sizes.is_empty() {
        return Err(PowerError::invalid("effect_sizes", 0.0, "grid axis is empty"));
    }
    if sample_sizes.contains(&0) {
        return Err(PowerError::invalid("n", 0.0, "must be at least 1"));
    }
    if let Some(bad) = effect_sizes.iter().find(|e| !e.is_finite()) {
        return Err(PowerError::invalid("effect_size", *bad, "must be finite"));
    }
    Ok(())
}

/// SplitMix64 finalizer over the sweep seed and a cell index
fn cell_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed.wrapping_add((index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
