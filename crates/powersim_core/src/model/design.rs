//! Experimental design types
//!
//! A design fixes the per-group sampling distributions and the per-group
//! sample size of one planned two-arm study.

use serde::{Deserialize, Serialize};

use crate::error::{PowerError, Result};

/// Number of arms compared by the engine
pub const NUM_GROUPS: usize = 2;

/// Sampling distribution of one experimental arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub mean: f64,
    pub std_dev: f64,
}

impl GroupSpec {
    #[must_use]
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    /// Unit-variance arm centered on `mean`
    #[must_use]
    pub const fn standard(mean: f64) -> Self {
        Self { mean, std_dev: 1.0 }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(PowerError::invalid("mean", self.mean, "must be finite"));
        }
        if !(self.std_dev.is_finite() && self.std_dev > 0.0) {
            return Err(PowerError::invalid(
                "std_dev",
                self.std_dev,
                "must be positive and finite",
            ));
        }
        Ok(())
    }
}

/// Per-group sample size plus one [`GroupSpec`] per arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignParameters {
    /// Observations drawn for each group
    pub n: usize,
    pub groups: Vec<GroupSpec>,
}

impl DesignParameters {
    #[must_use]
    pub fn new(n: usize, control: GroupSpec, treatment: GroupSpec) -> Self {
        Self {
            n,
            groups: vec![control, treatment],
        }
    }

    /// Control ~ N(0, 1) against treatment ~ N(effect_size, 1)
    #[must_use]
    pub fn two_sample(effect_size: f64, n: usize) -> Self {
        Self::new(n, GroupSpec::standard(0.0), GroupSpec::standard(effect_size))
    }

    /// Same distributions at a different sample size
    #[must_use]
    pub fn with_n(&self, n: usize) -> Self {
        Self {
            n,
            groups: self.groups.clone(),
        }
    }

    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Raw difference between the treatment and control means
    #[must_use]
    pub fn mean_difference(&self) -> f64 {
        match self.groups.as_slice() {
            [control, treatment] => treatment.mean - control.mean,
            _ => f64::NAN,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(PowerError::invalid("n", 0.0, "must be at least 1"));
        }
        if self.groups.len() != NUM_GROUPS {
            return Err(PowerError::invalid(
                "groups",
                self.groups.len() as f64,
                "exactly two groups are required",
            ));
        }
        self.groups.iter().try_for_each(GroupSpec::validate)
    }
}
