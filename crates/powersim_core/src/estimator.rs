//! Power estimation
//!
//! Simulates a batch of replicates for one design, tests every replicate and
//! reports the share that reached significance. A single pass is definitive:
//! noisy estimates call for more `sims`, never for retries.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::config::PowerConfig;
use crate::error::{PowerError, Result};
use crate::model::{DesignParameters, PowerEstimate};
use crate::significance::SignificanceTest;
use crate::trial::generate_batch;

/// Estimate power for `design` with the test selected in `config`.
///
/// The result is a random variable; only a seeded `rng` makes it repeatable.
pub fn estimate_power<R: RngCore + ?Sized>(
    design: &DesignParameters,
    config: &PowerConfig,
    rng: &mut R,
) -> Result<PowerEstimate> {
    estimate_power_with(design, config, &config.test, rng)
}

/// Same as [`estimate_power`] with a caller-supplied test.
pub fn estimate_power_with<R, T>(
    design: &DesignParameters,
    config: &PowerConfig,
    test: &T,
    rng: &mut R,
) -> Result<PowerEstimate>
where
    R: RngCore + ?Sized,
    T: SignificanceTest + ?Sized,
{
    config.validate()?;
    let batch = generate_batch(design, config.sims, rng)?;
    let p_values = test.p_values(&batch);
    let estimate = power_from_p_values(&p_values, config.alpha)?;

    if estimate.has_undefined() {
        tracing::warn!(
            n = design.n,
            undefined = estimate.undefined,
            sims = estimate.sims,
            "replicates with undefined test statistic counted as non-rejections"
        );
    }

    Ok(estimate)
}

/// Convenience wrapper that seeds a fresh `SmallRng`
pub fn estimate_power_seeded(
    design: &DesignParameters,
    config: &PowerConfig,
    seed: u64,
) -> Result<PowerEstimate> {
    let mut rng = SmallRng::seed_from_u64(seed);
    estimate_power(design, config, &mut rng)
}

/// Fraction of `p_values` strictly below `alpha`.
///
/// NaN entries are tallied as undefined and never reject.
pub fn power_from_p_values(p_values: &[f64], alpha: f64) -> Result<PowerEstimate> {
    if p_values.is_empty() {
        return Err(PowerError::invalid("sims", 0.0, "must be at least 1"));
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PowerError::invalid("alpha", alpha, "must lie in [0, 1]"));
    }

    let (rejections, undefined) = p_values
        .iter()
        .fold((0usize, 0usize), |(rejections, undefined), &p| {
            (
                rejections + usize::from(p < alpha),
                undefined + usize::from(p.is_nan()),
            )
        });

    Ok(PowerEstimate::from_counts(
        rejections,
        undefined,
        p_values.len(),
        alpha,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupSpec;
    use crate::significance::TestKind;

    #[test]
    fn test_threshold_is_strict() {
        let ps = [0.01, 0.05, 0.049_999, 0.2];
        let est = power_from_p_values(&ps, 0.05).unwrap();
        assert_eq!(est.rejections, 2);
        assert!((est.power - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_counts_as_non_rejection() {
        let ps = [f64::NAN, 0.001, f64::NAN, 0.9];
        let est = power_from_p_values(&ps, 0.05).unwrap();
        assert_eq!(est.rejections, 1);
        assert_eq!(est.undefined, 2);
        assert!((est.power - 0.25).abs() < 1e-12);
        assert!((est.undefined_fraction() - 0.5).abs() < 1e-12);

        // Even alpha = 1 never rejects an undefined statistic.
        let est = power_from_p_values(&ps, 1.0).unwrap();
        assert_eq!(est.rejections, 2);
    }

    #[test]
    fn test_empty_and_bad_alpha() {
        assert!(power_from_p_values(&[], 0.05).is_err());
        assert!(power_from_p_values(&[0.1], 2.0).is_err());
    }

    #[test]
    fn test_degenerate_design_rejected() {
        let config = PowerConfig::default().with_sims(100);
        assert!(matches!(
            estimate_power_seeded(&DesignParameters::two_sample(0.5, 0), &config, 1),
            Err(PowerError::InvalidParameter { parameter: "n", .. })
        ));
        assert!(matches!(
            estimate_power_seeded(
                &DesignParameters::two_sample(0.5, 10),
                &PowerConfig::default().with_sims(0),
                1
            ),
            Err(PowerError::InvalidParameter { parameter: "sims", .. })
        ));
        let bad_sd = DesignParameters::new(10, GroupSpec::new(0.0, -1.0), GroupSpec::standard(0.5));
        assert!(estimate_power_seeded(&bad_sd, &config, 1).is_err());
    }

    #[test]
    fn test_seeded_estimates_repeat() {
        let design = DesignParameters::two_sample(0.5, 20);
        let config = PowerConfig::default().with_sims(2_000);
        let a = estimate_power_seeded(&design, &config, 1234).unwrap();
        let b = estimate_power_seeded(&design, &config, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_observation_groups_are_undefined() {
        let design = DesignParameters::two_sample(1.0, 1);
        let config = PowerConfig::default().with_sims(50);
        let est = estimate_power_seeded(&design, &config, 3).unwrap();
        assert_eq!(est.undefined, 50);
        assert_eq!(est.power, 0.0);
    }

    #[test]
    fn test_custom_test_is_used() {
        struct AlwaysReject;
        impl SignificanceTest for AlwaysReject {
            fn p_value(&self, _a: &[f64], _b: &[f64]) -> f64 {
                0.0
            }
        }

        let design = DesignParameters::two_sample(0.0, 5);
        let config = PowerConfig::default().with_sims(64);
        let mut rng = SmallRng::seed_from_u64(0);
        let est = estimate_power_with(&design, &config, &AlwaysReject, &mut rng).unwrap();
        assert_eq!(est.power, 1.0);

        let est = estimate_power_with(&design, &config, &TestKind::WelchT, &mut rng).unwrap();
        assert!(est.power < 1.0);
    }
}
