//! Two-sample significance tests
//!
//! Independent two-sample t-tests over replicate arms. The t-distribution
//! itself comes from `statrs`.
//!
//! Degenerate samples (no within-group variance, too few observations for a
//! variance, or no degrees of freedom) yield a NaN p-value. NaN is never
//! coerced: the estimator counts it as undefined and, because `NaN < alpha` is
//! false, as a non-rejection.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::trial::SimulationBatch;

/// Outcome of a single t-test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestResult {
    pub statistic: f64,
    /// Degrees of freedom (fractional for Welch)
    pub df: f64,
    /// Two-tailed p-value, or NaN when the statistic is undefined
    pub p_value: f64,
}

impl TTestResult {
    const UNDEFINED: Self = Self {
        statistic: f64::NAN,
        df: f64::NAN,
        p_value: f64::NAN,
    };

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.p_value.is_nan()
    }
}

/// A test mapping two samples to a two-tailed p-value
pub trait SignificanceTest: Send + Sync {
    fn p_value(&self, a: &[f64], b: &[f64]) -> f64;

    /// One p-value per replicate, comparing group 0 against group 1
    fn p_values(&self, batch: &SimulationBatch) -> Vec<f64> {
        #[cfg(feature = "parallel")]
        {
            batch
                .par_replicates()
                .map(|r| self.p_value(r.control(), r.treatment()))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            batch
                .replicates()
                .map(|r| self.p_value(r.control(), r.treatment()))
                .collect()
        }
    }
}

/// Which t-test variant to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pooled-variance Student's t-test
    #[default]
    StudentT,
    /// Unequal-variance Welch t-test
    WelchT,
}

impl TestKind {
    #[must_use]
    pub fn run(self, a: &[f64], b: &[f64]) -> TTestResult {
        match self {
            TestKind::StudentT => student_t_test(a, b),
            TestKind::WelchT => welch_t_test(a, b),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TestKind::StudentT => "student",
            TestKind::WelchT => "welch",
        }
    }
}

impl SignificanceTest for TestKind {
    fn p_value(&self, a: &[f64], b: &[f64]) -> f64 {
        self.run(a, b).p_value
    }
}

/// Pooled-variance test, `df = n_a + n_b - 2`
pub fn student_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let (Some(sa), Some(sb)) = (Moments::of(a), Moments::of(b)) else {
        return TTestResult::UNDEFINED;
    };
    let df = sa.n + sb.n - 2.0;
    if df <= 0.0 {
        return TTestResult::UNDEFINED;
    }
    let pooled = (sa.ss + sb.ss) / df;
    let se_sq = pooled * (1.0 / sa.n + 1.0 / sb.n);
    finish(sa.mean - sb.mean, se_sq, df)
}

/// Welch test with Welch-Satterthwaite degrees of freedom
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let (Some(sa), Some(sb)) = (Moments::of(a), Moments::of(b)) else {
        return TTestResult::UNDEFINED;
    };
    if sa.n < 2.0 || sb.n < 2.0 {
        return TTestResult::UNDEFINED;
    }
    let va = sa.ss / (sa.n - 1.0) / sa.n;
    let vb = sb.ss / (sb.n - 1.0) / sb.n;
    let se_sq = va + vb;
    let df = se_sq * se_sq / (va * va / (sa.n - 1.0) + vb * vb / (sb.n - 1.0));
    finish(sa.mean - sb.mean, se_sq, df)
}

fn finish(diff: f64, se_sq: f64, df: f64) -> TTestResult {
    // Exactly constant arms carry no variance to test against.
    if se_sq.is_nan() || se_sq <= 0.0 || !df.is_finite() {
        return TTestResult::UNDEFINED;
    }
    let statistic = diff / se_sq.sqrt();
    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) if statistic.is_finite() => (2.0 * dist.sf(statistic.abs())).clamp(0.0, 1.0),
        _ => f64::NAN,
    };
    TTestResult {
        statistic,
        df,
        p_value,
    }
}

/// Count, mean and sum of squared deviations
struct Moments {
    n: f64,
    mean: f64,
    ss: f64,
}

impl Moments {
    fn of(xs: &[f64]) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let ss = xs.iter().map(|x| (x - mean).powi(2)).sum();
        Some(Self { n, mean, ss })
    }
}
