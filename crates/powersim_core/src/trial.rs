//! Trial generation
//!
//! Draws whole simulation batches into one flat buffer. Replicates are split
//! into fixed-size chunks and every chunk owns a `SmallRng` seeded from a value
//! drawn up front from the caller's generator. The chunk layout does not depend
//! on the thread count, so a seeded caller gets the same batch with or without
//! the `parallel` feature.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{PowerError, Result};
use crate::model::DesignParameters;

/// Replicates generated by one chunk generator
const REPLICATES_PER_CHUNK: usize = 128;

/// Largest number of draws a single batch buffer can address
const MAX_BATCH_VALUES: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// `sims` independent replicates sharing one design.
///
/// Logically shaped `(sims, n, groups)`. Storage is replicate-major with each
/// group's `n` draws contiguous, so a replicate's arms borrow as plain slices.
#[derive(Debug, Clone)]
pub struct SimulationBatch {
    sims: usize,
    n: usize,
    groups: usize,
    data: Vec<f64>,
}

impl SimulationBatch {
    /// `[sims, n, groups]`
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        [self.sims, self.n, self.groups]
    }

    #[must_use]
    pub fn sims(&self) -> usize {
        self.sims
    }

    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.groups
    }

    fn stride(&self) -> usize {
        self.n * self.groups
    }

    /// Draw `obs` of `group` in replicate `sim`
    #[must_use]
    pub fn value(&self, sim: usize, obs: usize, group: usize) -> Option<f64> {
        if sim >= self.sims || obs >= self.n || group >= self.groups {
            return None;
        }
        Some(self.data[sim * self.stride() + group * self.n + obs])
    }

    #[must_use]
    pub fn replicate(&self, sim: usize) -> Option<Replicate<'_>> {
        if sim >= self.sims {
            return None;
        }
        let stride = self.stride();
        Some(Replicate {
            n: self.n,
            data: &self.data[sim * stride..(sim + 1) * stride],
        })
    }

    pub fn replicates(&self) -> impl ExactSizeIterator<Item = Replicate<'_>> {
        let n = self.n;
        self.data
            .chunks_exact(self.stride())
            .map(move |data| Replicate { n, data })
    }

    #[cfg(feature = "parallel")]
    pub fn par_replicates(&self) -> impl IndexedParallelIterator<Item = Replicate<'_>> {
        let n = self.n;
        self.data
            .par_chunks_exact(self.stride())
            .map(move |data| Replicate { n, data })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// One simulated dataset borrowed from a [`SimulationBatch`]
#[derive(Debug, Clone, Copy)]
pub struct Replicate<'a> {
    n: usize,
    data: &'a [f64],
}

impl<'a> Replicate<'a> {
    /// Draws of one group. Panics if `group` is out of range.
    #[must_use]
    pub fn group(&self, group: usize) -> &'a [f64] {
        &self.data[group * self.n..(group + 1) * self.n]
    }

    #[must_use]
    pub fn control(&self) -> &'a [f64] {
        self.group(0)
    }

    #[must_use]
    pub fn treatment(&self) -> &'a [f64] {
        self.group(1)
    }
}

/// Generate `sims` replicates of `design` in a single pass.
///
/// Entropy comes only from `rng`: one `u64` per chunk of replicates.
pub fn generate_batch<R: RngCore + ?Sized>(
    design: &DesignParameters,
    sims: usize,
    rng: &mut R,
) -> Result<SimulationBatch> {
    design.validate()?;
    if sims == 0 {
        return Err(PowerError::invalid("sims", 0.0, "must be at least 1"));
    }

    let dists = design
        .groups
        .iter()
        .map(|g| {
            Normal::new(g.mean, g.std_dev).map_err(|_| {
                PowerError::invalid("std_dev", g.std_dev, "must be positive and finite")
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let stride = design
        .n
        .checked_mul(dists.len())
        .filter(|&len| len <= MAX_BATCH_VALUES)
        .ok_or_else(|| PowerError::invalid("n", design.n as f64, "batch size overflows"))?;
    let total = sims
        .checked_mul(stride)
        .filter(|&len| len <= MAX_BATCH_VALUES)
        .ok_or_else(|| PowerError::invalid("sims", sims as f64, "batch size overflows"))?;

    let num_chunks = sims.div_ceil(REPLICATES_PER_CHUNK);
    let seeds: Vec<u64> = (0..num_chunks).map(|_| rng.next_u64()).collect();
    let mut data = vec![0.0; total];
    // A chunk longer than the buffer just means a single chunk.
    let chunk_len = stride.saturating_mul(REPLICATES_PER_CHUNK);

    #[cfg(feature = "parallel")]
    data.par_chunks_mut(chunk_len)
        .zip(seeds.par_iter())
        .for_each(|(chunk, &seed)| fill_chunk(chunk, design.n, &dists, seed));

    #[cfg(not(feature = "parallel"))]
    data.chunks_mut(chunk_len)
        .zip(seeds.iter())
        .for_each(|(chunk, &seed)| fill_chunk(chunk, design.n, &dists, seed));

    Ok(SimulationBatch {
        sims,
        n: design.n,
        groups: dists.len(),
        data,
    })
}

fn fill_chunk(chunk: &mut [f64], n: usize, dists: &[Normal<f64>], seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for replicate in chunk.chunks_mut(n * dists.len()) {
        for (arm, dist) in replicate.chunks_mut(n).zip(dists) {
            for x in arm.iter_mut() {
                *x = dist.sample(&mut rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupSpec;

    fn mean(xs: &[f64]) -> f64 {
        xs.iter().sum::<f64>() / xs.len() as f64
    }

    #[test]
    fn test_batch_shape() {
        let mut rng = SmallRng::seed_from_u64(1);
        let design = DesignParameters::two_sample(0.5, 7);
        let batch = generate_batch(&design, 300, &mut rng).unwrap();
        assert_eq!(batch.shape(), [300, 7, 2]);
        assert_eq!(batch.as_slice().len(), 300 * 7 * 2);
        assert_eq!(batch.replicates().len(), 300);
        let rep = batch.replicate(299).unwrap();
        assert_eq!(rep.control().len(), 7);
        assert_eq!(rep.treatment().len(), 7);
        assert_eq!(batch.value(299, 6, 1), Some(rep.treatment()[6]));
        assert!(batch.replicate(300).is_none());
        assert!(batch.value(0, 7, 0).is_none());
    }

    #[test]
    fn test_group_moments() {
        let mut rng = SmallRng::seed_from_u64(7);
        let design = DesignParameters::new(50, GroupSpec::new(-2.0, 0.5), GroupSpec::new(3.0, 2.0));
        let batch = generate_batch(&design, 400, &mut rng).unwrap();

        let control: Vec<f64> = batch.replicates().flat_map(|r| r.control().to_vec()).collect();
        let treatment: Vec<f64> = batch
            .replicates()
            .flat_map(|r| r.treatment().to_vec())
            .collect();

        assert!((mean(&control) + 2.0).abs() < 0.02);
        assert!((mean(&treatment) - 3.0).abs() < 0.06);

        let m = mean(&treatment);
        let var = treatment.iter().map(|x| (x - m).powi(2)).sum::<f64>() / treatment.len() as f64;
        assert!((var.sqrt() - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let design = DesignParameters::two_sample(0.2, 12);
        let a = generate_batch(&design, 1000, &mut SmallRng::seed_from_u64(99)).unwrap();
        let b = generate_batch(&design, 1000, &mut SmallRng::seed_from_u64(99)).unwrap();
        let c = generate_batch(&design, 1000, &mut SmallRng::seed_from_u64(100)).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
        assert_ne!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn test_chunks_are_not_correlated() {
        let mut rng = SmallRng::seed_from_u64(3);
        let design = DesignParameters::two_sample(0.0, 4);
        let batch = generate_batch(&design, 2 * REPLICATES_PER_CHUNK, &mut rng).unwrap();
        let first = batch.replicate(0).unwrap();
        let second_chunk = batch.replicate(REPLICATES_PER_CHUNK).unwrap();
        assert_ne!(first.control(), second_chunk.control());
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = SmallRng::seed_from_u64(0);
        let design = DesignParameters::two_sample(0.5, 10);
        assert!(matches!(
            generate_batch(&design, 0, &mut rng),
            Err(PowerError::InvalidParameter { parameter: "sims", .. })
        ));
        assert!(generate_batch(&design.with_n(0), 10, &mut rng).is_err());

        let flat = DesignParameters::new(10, GroupSpec::new(0.0, 0.0), GroupSpec::standard(0.0));
        assert!(generate_batch(&flat, 10, &mut rng).is_err());
    }

    #[test]
    fn test_single_replicate() {
        let mut rng = SmallRng::seed_from_u64(5);
        let batch = generate_batch(&DesignParameters::two_sample(1.0, 3), 1, &mut rng).unwrap();
        assert_eq!(batch.shape(), [1, 3, 2]);
    }

    #[test]
    fn test_oversized_batches_are_rejected() {
        let mut rng = SmallRng::seed_from_u64(0);

        // n * groups overflows usize
        let huge_n = DesignParameters::two_sample(0.5, usize::MAX / 2 + 1);
        assert!(matches!(
            generate_batch(&huge_n, 1, &mut rng),
            Err(PowerError::InvalidParameter { parameter: "n", .. })
        ));

        // fits in usize but not in an addressable buffer
        let wide_n = DesignParameters::two_sample(0.5, usize::MAX / 8);
        assert!(matches!(
            generate_batch(&wide_n, 1, &mut rng),
            Err(PowerError::InvalidParameter { parameter: "n", .. })
        ));

        let design = DesignParameters::two_sample(0.5, 1_000);
        assert!(matches!(
            generate_batch(&design, usize::MAX / 1_000, &mut rng),
            Err(PowerError::InvalidParameter { parameter: "sims", .. })
        ));
    }
}
