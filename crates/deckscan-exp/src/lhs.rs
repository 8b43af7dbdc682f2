use deckscan_core::errors::ScanError;
use deckscan_core::rng::RngHandle;
use rand::{seq::SliceRandom, Rng};
use serde_json::Value;

use crate::params::{check_bounds, check_names, LhsParameter};
use crate::Sample;

/// Stratified random sampling of a box of parameters.
///
/// Every call to [`LatinHypercubeSampler::sample`] is an independent draw:
/// for `k` requested samples each parameter's range is cut into `k` equal
/// bins (equal in log space for `log` parameters) and each bin receives
/// exactly one value, while the pairing across parameters is shuffled.
#[derive(Debug, Clone)]
pub struct LatinHypercubeSampler {
    names: Vec<String>,
    // Bounds are stored as natural logarithms for log parameters.
    lower: Vec<f64>,
    upper: Vec<f64>,
    log: Vec<bool>,
    seed: u64,
    draws: u64,
}

impl LatinHypercubeSampler {
    /// Validates the bounds and prepares the sampler.
    ///
    /// Draw `d` uses the RNG substream `d` of `seed`, so rebuilding the sampler
    /// with the same seed replays the same draws.
    pub fn new(parameters: Vec<LhsParameter>, seed: u64) -> Result<Self, ScanError> {
        check_names(parameters.iter().map(|param| param.name.as_str()))?;
        let mut sampler = Self {
            names: Vec::with_capacity(parameters.len()),
            lower: Vec::with_capacity(parameters.len()),
            upper: Vec::with_capacity(parameters.len()),
            log: Vec::with_capacity(parameters.len()),
            seed,
            draws: 0,
        };
        for param in parameters {
            check_bounds(&param.name, param.min, param.max, param.log)?;
            let (lower, upper) = if param.log {
                (param.min.ln(), param.max.ln())
            } else {
                (param.min, param.max)
            };
            sampler.names.push(param.name);
            sampler.lower.push(lower);
            sampler.upper.push(upper);
            sampler.log.push(param.log);
        }
        Ok(sampler)
    }

    /// Number of parameters, i.e. the hypercube dimension.
    pub fn dimension(&self) -> usize {
        self.names.len()
    }

    /// Number of draws performed so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Performs one fresh stratified draw of `num` samples.
    pub fn sample(&mut self, num: usize) -> Vec<Sample> {
        if num == 0 {
            return Vec::new();
        }
        let mut rng = RngHandle::substream(self.seed, self.draws);
        self.draws += 1;
        unit_hypercube(num, self.dimension(), &mut rng)
            .into_iter()
            .map(|point| self.scale(&point))
            .collect()
    }

    fn scale(&self, point: &[f64]) -> Sample {
        let mut sample = Sample::new();
        for (dim, unit) in point.iter().enumerate() {
            let value = self.lower[dim] + unit * (self.upper[dim] - self.lower[dim]);
            let value = if self.log[dim] { value.exp() } else { value };
            sample.insert(self.names[dim].clone(), Value::from(value));
        }
        sample
    }
}

impl Iterator for LatinHypercubeSampler {
    type Item = Sample;

    /// Draws a single sample; the sequence never ends.
    fn next(&mut self) -> Option<Sample> {
        self.sample(1).pop()
    }
}

/// Latin hypercube points in `[0, 1)^dimension`.
///
/// Each dimension assigns the strata `0..num` to the points through an
/// independent random permutation and jitters uniformly inside the stratum.
pub fn unit_hypercube<R: Rng + ?Sized>(num: usize, dimension: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let mut points = vec![vec![0.0; dimension]; num];
    let mut strata: Vec<usize> = (0..num).collect();
    for dim in 0..dimension {
        strata.shuffle(rng);
        for (point, stratum) in points.iter_mut().zip(&strata) {
            let jitter: f64 = rng.gen();
            point[dim] = (*stratum as f64 + jitter) / num as f64;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_points_cover_every_stratum_once() {
        let mut rng = RngHandle::from_seed(11);
        let points = unit_hypercube(8, 3, &mut rng);
        for dim in 0..3 {
            let mut bins: Vec<usize> = points.iter().map(|p| (p[dim] * 8.0) as usize).collect();
            bins.sort_unstable();
            assert_eq!(bins, (0..8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn zero_samples_do_not_consume_a_draw() {
        let mut sampler =
            LatinHypercubeSampler::new(vec![LhsParameter::new("a:b", 0.0, 1.0)], 3).unwrap();
        assert!(sampler.sample(0).is_empty());
        assert_eq!(sampler.draws(), 0);
        assert_eq!(sampler.sample(2).len(), 2);
        assert_eq!(sampler.draws(), 1);
    }
}
