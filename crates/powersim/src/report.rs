//! Rendering of command results as text tables or JSON

use std::fmt;

use powersim_core::{PowerConfig, PowerCurve, PowerEstimate, PowerSurface};
use serde::Serialize;

use crate::cli::Format;
use crate::util::format::{format_percentage, format_power};

/// z for a two-sided 95% normal interval
const Z_95: f64 = 1.959_963_984_540_054;

/// Result of one `powersim` invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Estimate {
        seed: u64,
        config: PowerConfig,
        effect_size: f64,
        n: usize,
        estimate: PowerEstimate,
    },
    Search {
        seed: u64,
        config: PowerConfig,
        converged: bool,
        /// Smallest `n` reaching the target, when the search converged
        sample_size: Option<usize>,
        /// Why the search stopped early, when it did not converge
        divergence: Option<String>,
        curve: PowerCurve,
    },
    Sweep {
        seed: u64,
        config: PowerConfig,
        target_power: f64,
        surface: PowerSurface,
        /// Per effect size, the smallest swept `n` reaching `target_power`
        min_sample_sizes: Vec<Option<usize>>,
    },
}

impl Report {
    pub fn sweep(seed: u64, config: PowerConfig, target_power: f64, surface: PowerSurface) -> Self {
        let min_sample_sizes = (0..surface.effect_sizes.len())
            .map(|row| surface.min_sample_size_for(row, target_power))
            .collect();
        Report::Sweep {
            seed,
            config,
            target_power,
            surface,
            min_sample_sizes,
        }
    }

    /// True for a search that hit its bound before the target
    pub fn is_diverged(&self) -> bool {
        matches!(self, Report::Search { converged: false, .. })
    }

    pub fn render(&self, format: Format) -> color_eyre::Result<String> {
        match format {
            Format::Text => Ok(self.to_string()),
            Format::Json => {
                let mut json = serde_json::to_string_pretty(self)?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

fn write_header(f: &mut fmt::Formatter<'_>, config: &PowerConfig, seed: u64) -> fmt::Result {
    writeln!(
        f,
        "{} t-test, alpha = {}, {} replicates per estimate, seed {}",
        config.test.name(),
        config.alpha,
        config.sims,
        seed
    )
}

fn write_estimate(f: &mut fmt::Formatter<'_>, estimate: &PowerEstimate) -> fmt::Result {
    let (lo, hi) = estimate.confidence_interval(Z_95);
    writeln!(
        f,
        "power: {}  (95% CI {} to {})",
        format_power(estimate.power, estimate.standard_error),
        format_percentage(lo),
        format_percentage(hi)
    )?;
    writeln!(
        f,
        "rejections: {} of {}",
        estimate.rejections, estimate.sims
    )?;
    if estimate.has_undefined() {
        writeln!(
            f,
            "undefined statistics: {} ({}), counted as non-rejections",
            estimate.undefined,
            format_percentage(estimate.undefined_fraction())
        )?;
    }
    Ok(())
}

fn write_curve(f: &mut fmt::Formatter<'_>, curve: &PowerCurve) -> fmt::Result {
    writeln!(f, "{:>8}  {:>9}  {:>8}", "n", "power", "std err")?;
    for point in curve.iter() {
        let marker = if point.power() >= curve.target_power {
            " *"
        } else {
            ""
        };
        writeln!(
            f,
            "{:>8}  {:>9}  {:>8}{}",
            point.n,
            format_percentage(point.power()),
            format_percentage(point.estimate.standard_error),
            marker
        )?;
    }
    Ok(())
}

fn write_surface(
    f: &mut fmt::Formatter<'_>,
    surface: &PowerSurface,
    min_sample_sizes: &[Option<usize>],
    target_power: f64,
) -> fmt::Result {
    write!(f, "{:>8}", "d \\ n")?;
    for n in &surface.sample_sizes {
        write!(f, "  {n:>7}")?;
    }
    writeln!(f, "  {:>8}", format!("n@{}", format_percentage(target_power)))?;

    for (row, effect_size) in surface.effect_sizes.iter().enumerate() {
        write!(f, "{effect_size:>8.3}")?;
        for power in surface.row(row).unwrap_or_default() {
            write!(f, "  {:>7}", format!("{:.1}%", power * 100.0))?;
        }
        match min_sample_sizes.get(row).copied().flatten() {
            Some(n) => writeln!(f, "  {n:>8}")?,
            None => writeln!(f, "  {:>8}", "-")?,
        }
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Estimate {
                seed,
                config,
                effect_size,
                n,
                estimate,
            } => {
                write_header(f, config, *seed)?;
                writeln!(f, "effect size {effect_size}, n = {n} per group")?;
                write_estimate(f, estimate)
            }
            Report::Search {
                seed,
                config,
                sample_size,
                divergence,
                curve,
                ..
            } => {
                write_header(f, config, *seed)?;
                writeln!(
                    f,
                    "effect size {}, target power {}",
                    curve.effect_size,
                    format_percentage(curve.target_power)
                )?;
                writeln!(f)?;
                write_curve(f, curve)?;
                writeln!(f)?;
                match (sample_size, divergence) {
                    (Some(n), _) => writeln!(
                        f,
                        "n = {n} per group reaches the target after {} steps",
                        curve.len()
                    ),
                    (None, Some(reason)) => writeln!(
                        f,
                        "target not reached: {reason}; best power {}",
                        format_percentage(curve.best_power())
                    ),
                    (None, None) => writeln!(f, "target not reached"),
                }
            }
            Report::Sweep {
                seed,
                config,
                target_power,
                surface,
                min_sample_sizes,
            } => {
                write_header(f, config, *seed)?;
                let (rows, cols) = surface.shape();
                writeln!(f, "{rows} effect sizes × {cols} sample sizes")?;
                writeln!(f)?;
                write_surface(f, surface, min_sample_sizes, *target_power)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powersim_core::{DivergenceReason, PowerError};

    fn estimate(power: f64) -> PowerEstimate {
        let sims = 1_000;
        PowerEstimate::from_counts((power * sims as f64).round() as usize, 0, sims, 0.05)
    }

    fn curve() -> PowerCurve {
        let mut curve = PowerCurve::new(0.8, 0.8);
        curve.push(24, estimate(0.75));
        curve.push(25, estimate(0.79));
        curve.push(26, estimate(0.81));
        curve
    }

    #[test]
    fn test_estimate_text() {
        let report = Report::Estimate {
            seed: 42,
            config: PowerConfig::default(),
            effect_size: 0.8,
            n: 30,
            estimate: PowerEstimate::from_counts(860, 3, 1_000, 0.05),
        };
        let text = report.render(Format::Text).unwrap();
        assert!(text.starts_with("student t-test, alpha = 0.05"));
        assert!(text.contains("seed 42"));
        assert!(text.contains("power: 86.00%"));
        assert!(text.contains("rejections: 860 of 1000"));
        assert!(text.contains("undefined statistics: 3"));
        assert!(!report.is_diverged());
    }

    #[test]
    fn test_search_text_marks_terminal_step() {
        let report = Report::Search {
            seed: 1,
            config: PowerConfig::default(),
            converged: true,
            sample_size: Some(26),
            divergence: None,
            curve: curve(),
        };
        let text = report.to_string();
        let starred: Vec<&str> = text.lines().filter(|l| l.ends_with(" *")).collect();
        assert_eq!(starred.len(), 1);
        assert!(starred[0].trim_start().starts_with("26"));
        assert!(text.contains("n = 26 per group reaches the target after 3 steps"));
    }

    #[test]
    fn test_diverged_search_report() {
        let mut partial = PowerCurve::new(0.1, 0.99);
        partial.push(5, estimate(0.06));
        let err = PowerError::SearchDivergence {
            reason: DivergenceReason::SampleSizeLimit { max_n: 5 },
            target_power: 0.99,
            best_power: 0.06,
            curve: partial.clone(),
        };
        let report = Report::Search {
            seed: 1,
            config: PowerConfig::default(),
            converged: false,
            sample_size: None,
            divergence: Some(err.to_string()),
            curve: partial,
        };
        assert!(report.is_diverged());
        assert!(report.to_string().contains("target not reached"));
    }

    #[test]
    fn test_sweep_json_and_min_n_column() {
        let surface = PowerSurface::from_cells(
            vec![0.2, 0.8],
            vec![10, 20],
            vec![estimate(0.1), estimate(0.2), estimate(0.4), estimate(0.85)],
        )
        .unwrap();
        let report = Report::sweep(9, PowerConfig::default(), 0.8, surface);
        match &report {
            Report::Sweep {
                min_sample_sizes, ..
            } => assert_eq!(min_sample_sizes, &vec![None, Some(20)]),
            other => panic!("unexpected report {other:?}"),
        }

        let json = report.render(Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "sweep");
        assert_eq!(value["seed"], 9);
        assert_eq!(value["config"]["test"], "student_t");
        assert_eq!(value["surface"]["sample_sizes"], serde_json::json!([10, 20]));

        let text = report.to_string();
        assert!(text.contains("2 effect sizes × 2 sample sizes"));
        assert!(text.contains("85.0%"));
    }
}
