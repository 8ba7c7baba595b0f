//! Statistical tests for the power-simulation engine
//!
//! Tests are organized by topic:
//! - `calibration` - Type I error rate, power growth with n, reference scenario
//! - `search_scenarios` - Sample-size search end to end
//! - `sweep_surface` - Monotonicity of averaged power surfaces
//!
//! All tests use fixed seeds. Tolerances are several Monte Carlo standard
//! errors wide.

mod sweep_surface;
