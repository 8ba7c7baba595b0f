//! Sample-size search
//!
//! Walks `n` upward one step at a time until the estimated power first reaches
//! the target. Each step depends on the previous one falling short, so steps
//! run strictly in sequence; the parallelism lives inside each estimate.
//!
//! Monte Carlo noise can make power dip between neighbouring steps. The stop
//! rule is the plain one-sided comparison `power >= target` with no smoothing,
//! and the walk is always bounded by `max_n` and, optionally, a time budget.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::config::{PowerConfig, SearchConfig};
use crate::error::{DivergenceReason, PowerError, Result};
use crate::estimator::estimate_power;
use crate::model::{DesignParameters, PowerCurve};
use crate::progress::Progress;

/// Find the smallest `n` in `[start_n, max_n]` whose estimate reaches the target.
///
/// Returns the whole trajectory from `start_n` through the terminal step.
/// Exceeding a bound yields [`PowerError::SearchDivergence`] carrying the
/// partial trajectory. Cancelling `progress` yields [`PowerError::Cancelled`].
pub fn find_sample_size<R: RngCore + ?Sized>(
    search: &SearchConfig,
    config: &PowerConfig,
    rng: &mut R,
    progress: Option<&Progress>,
) -> Result<PowerCurve> {
    search.validate()?;
    config.validate()?;

    if let Some(progress) = progress {
        progress.reset(search.max_n - search.start_n + 1);
    }

    let started = Instant::now();
    let mut curve = PowerCurve::new(search.effect_size, search.target_power);
    let mut design = DesignParameters::two_sample(search.effect_size, search.start_n);

    for n in search.start_n..=search.max_n {
        if progress.is_some_and(Progress::is_cancelled) {
            return Err(PowerError::Cancelled);
        }
        if let Some(budget) = search.time_budget
            && started.elapsed() >= budget
        {
            return Err(diverged(
                DivergenceReason::TimeBudget { budget },
                search,
                curve,
            ));
        }

        design.n = n;
        let estimate = estimate_power(&design, config, rng)?;
        tracing::debug!(n, power = estimate.power, "sample-size search step");
        curve.push(n, estimate);

        if let Some(progress) = progress {
            progress.increment();
        }

        if estimate.power >= search.target_power {
            tracing::info!(
                n,
                power = estimate.power,
                target = search.target_power,
                steps = curve.len(),
                "sample-size search converged"
            );
            return Ok(curve);
        }
    }

    Err(diverged(
        DivergenceReason::SampleSizeLimit { max_n: search.max_n },
        search,
        curve,
    ))
}

/// Convenience wrapper that seeds a fresh `SmallRng`
pub fn find_sample_size_seeded(
    search: &SearchConfig,
    config: &PowerConfig,
    seed: u64,
    progress: Option<&Progress>,
) -> Result<PowerCurve> {
    let mut rng = SmallRng::seed_from_u64(seed);
    find_sample_size(search, config, &mut rng, progress)
}

fn diverged(reason: DivergenceReason, search: &SearchConfig, curve: PowerCurve) -> PowerError {
    let best_power = curve.best_power();
    tracing::warn!(
        %reason,
        target = search.target_power,
        best_power,
        steps = curve.len(),
        "sample-size search diverged"
    );
    PowerError::SearchDivergence {
        reason,
        target_power: search.target_power,
        best_power,
        curve,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_config() -> PowerConfig {
        PowerConfig::default().with_sims(400)
    }

    #[test]
    fn test_trajectory_is_contiguous() {
        let search = SearchConfig::new(0.8, 1.5).with_start_n(2);
        let curve = find_sample_size_seeded(&search, &fast_config(), 8, None).unwrap();
        let ns: Vec<usize> = curve.iter().map(|p| p.n).collect();
        let expected: Vec<usize> = (2..2 + ns.len()).collect();
        assert_eq!(ns, expected);
        assert!(curve.reached_target());
        // Only the terminal step may meet the target.
        assert!(
            curve.points[..curve.len() - 1]
                .iter()
                .all(|p| p.power() < 0.8)
        );
    }

    #[test]
    fn test_immediate_success_returns_single_point() {
        let search = SearchConfig::new(0.5, 3.0).with_start_n(20);
        let curve = find_sample_size_seeded(&search, &fast_config(), 1, None).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.final_point().map(|p| p.n), Some(20));
    }

    #[test]
    fn test_sample_size_limit_diverges_with_partial_curve() {
        let search = SearchConfig::new(0.99, 0.1).with_start_n(5).with_max_n(8);
        let err = find_sample_size_seeded(&search, &fast_config(), 2, None).unwrap_err();
        match err {
            PowerError::SearchDivergence {
                reason, curve, best_power, ..
            } => {
                assert_eq!(reason, DivergenceReason::SampleSizeLimit { max_n: 8 });
                assert_eq!(curve.len(), 4);
                assert_eq!(curve.final_point().map(|p| p.n), Some(8));
                assert!(best_power < 0.99);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_time_budget_diverges() {
        let search = SearchConfig::new(0.8, 0.5).with_time_budget(Duration::ZERO);
        let err = find_sample_size_seeded(&search, &fast_config(), 2, None).unwrap_err();
        assert!(matches!(
            err,
            PowerError::SearchDivergence {
                reason: DivergenceReason::TimeBudget { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_cancelled_search() {
        let progress = Progress::new(0);
        progress.cancel();
        let search = SearchConfig::new(0.8, 0.5);
        let err = find_sample_size_seeded(&search, &fast_config(), 2, Some(&progress)).unwrap_err();
        assert!(matches!(err, PowerError::Cancelled));
    }

    #[test]
    fn test_progress_counts_steps() {
        let progress = Progress::new(0);
        let search = SearchConfig::new(0.99, 0.1).with_start_n(3).with_max_n(6);
        let _ = find_sample_size_seeded(&search, &fast_config(), 2, Some(&progress));
        assert_eq!(progress.total(), 4);
        assert_eq!(progress.completed(), 4);
    }

    #[test]
    fn test_invalid_search_rejected_before_simulating() {
        let search = SearchConfig::new(0.0, 0.5);
        assert!(matches!(
            find_sample_size_seeded(&search, &fast_config(), 0, None),
            Err(PowerError::InvalidParameter { .. })
        ));
        let search = SearchConfig::new(0.8, 0.5);
        assert!(find_sample_size_seeded(&search, &PowerConfig::default().with_sims(0), 0, None).is_err());
    }

    #[test]
    fn test_seeded_search_repeats() {
        let search = SearchConfig::new(0.8, 0.8);
        let a = find_sample_size_seeded(&search, &fast_config(), 77, None).unwrap();
        let b = find_sample_size_seeded(&search, &fast_config(), 77, None).unwrap();
        assert_eq!(a, b);
    }
}
