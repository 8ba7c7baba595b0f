//! Configuration for power estimation and sample-size search
//!
//! Both structs deserialize with defaults for every omitted field, so a study
//! file only needs to name what it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PowerError, Result};
use crate::significance::TestKind;

/// How each power estimate is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Replicates simulated per estimate
    #[serde(default = "default_sims")]
    pub sims: usize,

    /// Significance threshold; a replicate rejects when `p < alpha`
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    #[serde(default)]
    pub test: TestKind,
}

fn default_sims() -> usize {
    10_000
}

fn default_alpha() -> f64 {
    0.05
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            sims: default_sims(),
            alpha: default_alpha(),
            test: TestKind::default(),
        }
    }
}

impl PowerConfig {
    #[must_use]
    pub fn with_sims(mut self, sims: usize) -> Self {
        self.sims = sims;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_test(mut self, test: TestKind) -> Self {
        self.test = test;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sims == 0 {
            return Err(PowerError::invalid("sims", 0.0, "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(PowerError::invalid(
                "alpha",
                self.alpha,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Bounds and target of a sample-size search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop at the first `n` whose estimated power reaches this
    #[serde(default = "default_target_power")]
    pub target_power: f64,

    /// Mean difference between two unit-variance groups
    pub effect_size: f64,

    #[serde(default = "default_start_n")]
    pub start_n: usize,

    /// Largest `n` evaluated before the search diverges
    #[serde(default = "default_max_n")]
    pub max_n: usize,

    /// Wall-clock limit checked between steps
    #[serde(default)]
    pub time_budget: Option<Duration>,
}

fn default_target_power() -> f64 {
    0.8
}

fn default_start_n() -> usize {
    10
}

fn default_max_n() -> usize {
    10_000
}

impl SearchConfig {
    #[must_use]
    pub fn new(target_power: f64, effect_size: f64) -> Self {
        Self {
            target_power,
            effect_size,
            start_n: default_start_n(),
            max_n: default_max_n(),
            time_budget: None,
        }
    }

    #[must_use]
    pub fn with_start_n(mut self, start_n: usize) -> Self {
        self.start_n = start_n;
        self
    }

    #[must_use]
    pub fn with_max_n(mut self, max_n: usize) -> Self {
        self.max_n = max_n;
        self
    }

    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.target_power > 0.0 && self.target_power <= 1.0) {
            return Err(PowerError::invalid(
                "target_power",
                self.target_power,
                "must lie in (0, 1]",
            ));
        }
        if !self.effect_size.is_finite() {
            return Err(PowerError::invalid(
                "effect_size",
                self.effect_size,
                "must be finite",
            ));
        }
        if self.start_n == 0 {
            return Err(PowerError::invalid("start_n", 0.0, "must be at least 1"));
        }
        if self.max_n < self.start_n {
            return Err(PowerError::invalid(
                "max_n",
                self.max_n as f64,
                "must be at least start_n",
            ));
        }
        Ok(())
    }
}
