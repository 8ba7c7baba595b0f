use std::fmt;
use std::time::Duration;

use crate::model::PowerCurve;

/// Which bound stopped a sample-size search before it reached its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DivergenceReason {
    /// `n` would have exceeded the configured maximum
    SampleSizeLimit { max_n: usize },
    /// The wall-clock budget ran out between steps
    TimeBudget { budget: Duration },
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceReason::SampleSizeLimit { max_n } => {
                write!(f, "sample size limit n={max_n} reached")
            }
            DivergenceReason::TimeBudget { budget } => {
                write!(f, "time budget of {:.3}s exhausted", budget.as_secs_f64())
            }
        }
    }
}

/// Errors produced by the power-simulation engine
#[derive(Debug, Clone)]
pub enum PowerError {
    /// A parameter was rejected at a call boundary. Values are never clamped.
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// The sample-size search hit its bound without reaching the target power.
    ///
    /// `curve` holds every step evaluated before the bound was hit.
    SearchDivergence {
        reason: DivergenceReason,
        target_power: f64,
        best_power: f64,
        curve: PowerCurve,
    },
    /// Work was cancelled through a shared [`crate::Progress`] handle
    Cancelled,
}

impl PowerError {
    pub(crate) fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        PowerError::InvalidParameter {
            parameter,
            value,
            reason,
        }
    }

    /// Partial trajectory of a diverged search, if this is a divergence
    #[must_use]
    pub fn partial_curve(&self) -> Option<&PowerCurve> {
        match self {
            PowerError::SearchDivergence { curve, .. } => Some(curve),
            _ => None,
        }
    }
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerError::InvalidParameter {
                parameter,
                value,
                reason,
            } => write!(f, "invalid {parameter} ({value}): {reason}"),
            PowerError::SearchDivergence {
                reason,
                target_power,
                best_power,
                curve,
            } => write!(
                f,
                "search did not reach power {target_power} after {} steps ({reason}); best power was {best_power}",
                curve.len()
            ),
            PowerError::Cancelled => write!(f, "power simulation cancelled"),
        }
    }
}

impl std::error::Error for PowerError {}

pub type Result<T> = std::result::Result<T, PowerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = PowerError::invalid("n", 0.0, "must be at least 1");
        assert_eq!(err.to_string(), "invalid n (0): must be at least 1");
        assert!(err.partial_curve().is_none());
    }

    #[test]
    fn test_divergence_display_mentions_reason() {
        let err = PowerError::SearchDivergence {
            reason: DivergenceReason::SampleSizeLimit { max_n: 12 },
            target_power: 0.9,
            best_power: 0.4,
            curve: PowerCurve::default(),
        };
        let msg = err.to_string();
        assert!(msg.contains("n=12"));
        assert!(msg.contains("0.9"));
        assert!(err.partial_curve().is_some());
    }
}
