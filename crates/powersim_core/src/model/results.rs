//! Power estimation results
//!
//! Output types of the estimator, the sample-size search and the grid sweep.
//! These are what a presentation layer consumes; nothing here performs
//! simulation.

use serde::{Deserialize, Serialize};

/// Fraction of replicates whose p-value fell strictly below `alpha`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerEstimate {
    /// Estimated power in `[0, 1]`
    pub power: f64,
    /// Number of replicates simulated
    pub sims: usize,
    /// Replicates with `p < alpha`
    pub rejections: usize,
    /// Replicates whose test statistic was undefined (NaN p-value).
    /// These always count as non-rejections.
    pub undefined: usize,
    /// Significance threshold used
    pub alpha: f64,
    /// Monte Carlo standard error, `sqrt(p(1-p)/sims)`
    pub standard_error: f64,
}

impl PowerEstimate {
    /// Build an estimate from raw counts
    #[must_use]
    pub fn from_counts(rejections: usize, undefined: usize, sims: usize, alpha: f64) -> Self {
        let power = if sims == 0 {
            0.0
        } else {
            rejections as f64 / sims as f64
        };
        let standard_error = if sims == 0 {
            0.0
        } else {
            (power * (1.0 - power) / sims as f64).sqrt()
        };
        Self {
            power,
            sims,
            rejections,
            undefined,
            alpha,
            standard_error,
        }
    }

    /// Share of replicates with an undefined statistic
    #[must_use]
    pub fn undefined_fraction(&self) -> f64 {
        if self.sims == 0 {
            0.0
        } else {
            self.undefined as f64 / self.sims as f64
        }
    }

    #[must_use]
    pub fn has_undefined(&self) -> bool {
        self.undefined > 0
    }

    /// Normal-approximation interval `power ± z·SE`, truncated to `[0, 1]`
    #[must_use]
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let half = z * self.standard_error;
        ((self.power - half).max(0.0), (self.power + half).min(1.0))
    }
}

/// One step of a sample-size search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub n: usize,
    pub estimate: PowerEstimate,
}

impl CurvePoint {
    #[must_use]
    pub fn power(&self) -> f64 {
        self.estimate.power
    }
}

/// Ordered (sample size, power) trajectory of a sample-size search.
///
/// Non-decreasing in expectation only; adjacent points can dip from noise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    pub effect_size: f64,
    pub target_power: f64,
    pub points: Vec<CurvePoint>,
}

impl PowerCurve {
    #[must_use]
    pub fn new(effect_size: f64, target_power: f64) -> Self {
        Self {
            effect_size,
            target_power,
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, n: usize, estimate: PowerEstimate) {
        self.points.push(CurvePoint { n, estimate });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Terminal step; for a converged search this is the chosen sample size
    #[must_use]
    pub fn final_point(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    /// Highest power seen at any step
    #[must_use]
    pub fn best_power(&self) -> f64 {
        self.points.iter().map(CurvePoint::power).fold(0.0, f64::max)
    }

    /// Whether the last step met the target
    #[must_use]
    pub fn reached_target(&self) -> bool {
        self.final_point()
            .is_some_and(|p| p.power() >= self.target_power)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurvePoint> {
        self.points.iter()
    }
}

/// Power over an (effect size × sample size) grid.
///
/// Stored row-major: one row per effect size, one column per sample size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSurface {
    pub effect_sizes: Vec<f64>,
    pub sample_sizes: Vec<usize>,
    cells: Vec<PowerEstimate>,
}

impl PowerSurface {
    /// Assemble a surface from row-major cells. Returns `None` on a shape mismatch.
    #[must_use]
    pub fn from_cells(
        effect_sizes: Vec<f64>,
        sample_sizes: Vec<usize>,
        cells: Vec<PowerEstimate>,
    ) -> Option<Self> {
        if grid_len(effect_sizes.len(), sample_sizes.len()) != Some(cells.len()) {
            return None;
        }
        Some(Self {
            effect_sizes,
            sample_sizes,
            cells,
        })
    }

    /// (rows, columns)
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.effect_sizes.len(), self.sample_sizes.len())
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&PowerEstimate> {
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return None;
        }
        self.cells.get(row * cols + col)
    }

    /// Power at (effect size index, sample size index)
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).map(|c| c.power)
    }

    /// Power values for one effect size across all sample sizes
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        let (rows, cols) = self.shape();
        (row < rows).then(|| {
            self.cells[row * cols..(row + 1) * cols]
                .iter()
                .map(|c| c.power)
                .collect()
        })
    }

    /// Power values for one sample size across all effect sizes
    #[must_use]
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        let (rows, cols) = self.shape();
        (col < cols).then(|| (0..rows).map(|r| self.cells[r * cols + col].power).collect())
    }

    /// Power matrix as nested rows, for plotting
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        let (_, cols) = self.shape();
        if cols == 0 {
            return vec![Vec::new(); self.effect_sizes.len()];
        }
        self.cells
            .chunks(cols)
            .map(|row| row.iter().map(|c| c.power).collect())
            .collect()
    }

    /// Smallest swept sample size whose cell in `row` reaches `target`
    #[must_use]
    pub fn min_sample_size_for(&self, row: usize, target: f64) -> Option<usize> {
        let powers = self.row(row)?;
        self.sample_sizes
            .iter()
            .zip(powers)
            .filter(|(_, p)| *p >= target)
            .map(|(n, _)| *n)
            .min()
    }

    pub fn cells(&self) -> &[PowerEstimate] {
        &self.cells
    }
}

/// Cell count of a `rows × cols` grid, or `None` if it overflows
#[must_use]
pub(crate) fn grid_len(rows: usize, cols: usize) -> Option<usize> {
    rows.checked_mul(cols)
}
