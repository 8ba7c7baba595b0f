//! Monte Carlo power analysis library
//!
//! This crate estimates the statistical power of a two-sample comparison of
//! means by simulation rather than closed-form formulas. It supports:
//! - Batched generation of two-group Normal replicates from a seedable generator
//! - Student and Welch two-sample t-tests applied per replicate
//! - Power estimation with Monte Carlo standard errors and undefined-statistic diagnostics
//! - A bounded sample-size search that walks `n` up to a target power
//! - Parallel power surfaces over effect size × sample size grids
//!
//! # Example
//!
//! ```no_run
//! use powersim_core::{PowerConfig, SearchConfig, find_sample_size_seeded};
//!
//! let search = SearchConfig::new(0.8, 0.8).with_start_n(10).with_max_n(200);
//! let config = PowerConfig::default().with_sims(10_000);
//!
//! let curve = find_sample_size_seeded(&search, &config, 42, None)?;
//! if let Some(point) = curve.final_point() {
//!     println!("n = {} reaches power {:.3}", point.n, point.power());
//! }
//! # Ok::<(), powersim_core::PowerError>(())
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod estimator;
pub mod progress;
pub mod search;
pub mod significance;
pub mod sweep;
pub mod trial;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{PowerConfig, SearchConfig};
pub use error::{DivergenceReason, PowerError};
pub use estimator::{estimate_power, estimate_power_seeded, estimate_power_with, power_from_p_values};
pub use model::{CurvePoint, DesignParameters, GroupSpec, PowerCurve, PowerEstimate, PowerSurface};
pub use progress::Progress;
pub use search::{find_sample_size, find_sample_size_seeded};
pub use significance::{SignificanceTest, TTestResult, TestKind};
pub use sweep::sweep_power;
pub use trial::{Replicate, SimulationBatch, generate_batch};
