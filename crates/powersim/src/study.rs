//! Study files
//!
//! A study file is YAML describing a planned power analysis. Every field is
//! optional; command-line flags win over the file and the file wins over the
//! engine defaults.
//!
//! ```yaml
//! sims: 20000
//! alpha: 0.05
//! test: welch_t
//! seed: 42
//! search:
//!   target_power: 0.9
//!   effect_size: 0.5
//!   max_n: 500
//!   time_budget_secs: 30
//! sweep:
//!   sample_sizes: [10, 20, 30, 40, 50]
//!   effect_sizes: [0.2, 0.5, 0.8]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{WrapErr, bail};
use powersim_core::{PowerConfig, SearchConfig, TestKind};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub sims: Option<usize>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub test: Option<TestKind>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub sweep: SweepSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub target_power: Option<f64>,
    #[serde(default)]
    pub effect_size: Option<f64>,
    #[serde(default)]
    pub start_n: Option<usize>,
    #[serde(default)]
    pub max_n: Option<usize>,
    #[serde(default)]
    pub time_budget_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SweepSection {
    #[serde(default)]
    pub sample_sizes: Option<Vec<usize>>,
    #[serde(default)]
    pub effect_sizes: Option<Vec<f64>>,
    #[serde(default)]
    pub target_power: Option<f64>,
}

/// Effect size used by `search` when neither flag nor file sets one
pub const DEFAULT_EFFECT_SIZE: f64 = 0.5;

pub const DEFAULT_TARGET_POWER: f64 = 0.8;

impl StudyConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read study file {}", path.display()))?;
        Self::from_yaml(&content)
            .wrap_err_with(|| format!("failed to parse study file {}", path.display()))
    }

    /// Load the explicit file, else the default file if it exists, else defaults
    pub fn resolve(explicit: Option<&Path>) -> color_eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_study_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "using default study file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Merge flag overrides, the file, and engine defaults
    #[must_use]
    pub fn power_config(
        &self,
        sims: Option<usize>,
        alpha: Option<f64>,
        test: Option<TestKind>,
    ) -> PowerConfig {
        let defaults = PowerConfig::default();
        PowerConfig {
            sims: sims.or(self.sims).unwrap_or(defaults.sims),
            alpha: alpha.or(self.alpha).unwrap_or(defaults.alpha),
            test: test.or(self.test).unwrap_or(defaults.test),
        }
    }

    /// Build the search bounds; `overrides` has the same shape as the file section
    pub fn search_config(&self, overrides: &SearchSection) -> color_eyre::Result<SearchConfig> {
        let file = &self.search;
        let effect_size = overrides
            .effect_size
            .or(file.effect_size)
            .unwrap_or(DEFAULT_EFFECT_SIZE);
        let target_power = overrides
            .target_power
            .or(file.target_power)
            .unwrap_or(DEFAULT_TARGET_POWER);
        let mut config = SearchConfig::new(target_power, effect_size);
        if let Some(start_n) = overrides.start_n.or(file.start_n) {
            config.start_n = start_n;
        }
        if let Some(max_n) = overrides.max_n.or(file.max_n) {
            config.max_n = max_n;
        }
        if let Some(secs) = overrides.time_budget_secs.or(file.time_budget_secs) {
            if !(secs.is_finite() && secs >= 0.0) {
                bail!("time budget must be a non-negative number of seconds, got {secs}");
            }
            config.time_budget = Some(Duration::from_secs_f64(secs));
        }
        Ok(config)
    }

    /// Sweep axes: flags, then file, then 10..=50 by 5 and 0.2..=0.9 by 0.1
    pub fn sweep_axes(
        &self,
        sample_sizes: Option<&str>,
        effect_sizes: Option<&str>,
    ) -> color_eyre::Result<(Vec<usize>, Vec<f64>)> {
        let sample_sizes = match sample_sizes {
            Some(spec) => parse_sample_sizes(spec)?,
            None => self
                .sweep
                .sample_sizes
                .clone()
                .unwrap_or_else(|| (10..=50).step_by(5).collect()),
        };
        let effect_sizes = match effect_sizes {
            Some(spec) => parse_effect_sizes(spec)?,
            None => self
                .sweep
                .effect_sizes
                .clone()
                .unwrap_or_else(|| (2..=9).map(|i| f64::from(i) / 10.0).collect()),
        };
        Ok((sample_sizes, effect_sizes))
    }
}

fn default_study_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".powersim").join("study.yaml"))
}

/// `10,20,30` or inclusive `start:stop:step`
pub fn parse_sample_sizes(spec: &str) -> color_eyre::Result<Vec<usize>> {
    if let Some((start, stop, step)) = split_range(spec) {
        let start: usize = start.parse().wrap_err("invalid range start")?;
        let stop: usize = stop.parse().wrap_err("invalid range stop")?;
        let step: usize = step.parse().wrap_err("invalid range step")?;
        if step == 0 || stop < start {
            bail!("range {spec} must have step > 0 and stop >= start");
        }
        return Ok((start..=stop).step_by(step).collect());
    }
    spec.split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .wrap_err_with(|| format!("invalid sample size {s:?}"))
        })
        .collect()
}

/// `0.2,0.5` or inclusive `start:stop:step`
pub fn parse_effect_sizes(spec: &str) -> color_eyre::Result<Vec<f64>> {
    if let Some((start, stop, step)) = split_range(spec) {
        let start: f64 = start.parse().wrap_err("invalid range start")?;
        let stop: f64 = stop.parse().wrap_err("invalid range stop")?;
        let step: f64 = step.parse().wrap_err("invalid range step")?;
        if step.is_nan() || step <= 0.0 || stop < start {
            bail!("range {spec} must have step > 0 and stop >= start");
        }
        // Tolerance keeps float accumulation from dropping the stop value.
        let count = ((stop - start) / step + 1e-9).floor() as usize;
        return Ok((0..=count)
            .map(|i| round_grid(start + step * i as f64))
            .collect());
    }
    spec.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .wrap_err_with(|| format!("invalid effect size {s:?}"))
        })
        .collect()
}

fn split_range(spec: &str) -> Option<(&str, &str, &str)> {
    let mut parts = spec.split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => Some((a, b, c)),
        _ => None,
    }
}

fn round_grid(x: f64) -> f64 {
    (x * 1e9).round() / 1e9
}
