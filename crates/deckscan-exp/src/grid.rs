use deckscan_core::errors::{ErrorInfo, ScanError};
use serde_json::Value;

use crate::params::{check_bounds, check_names, GridParameter, ParameterSpec, RangeSpec};
use crate::Sample;

/// Sample count used by [`GridSampler`] when a range gives none.
pub const DEFAULT_GRID_SAMPLES: usize = 10;

/// Uniform sampling of the Cartesian product of the parameter axes.
///
/// The product is ordered the way an `ij`-indexed meshgrid iterates: the
/// first declared parameter varies slowest, the last one fastest. Samples are
/// decoded on demand from a position in `[0, len)`, and a cursor tracks how
/// far iteration (or [`GridSampler::sample`]) has advanced.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSampler {
    names: Vec<String>,
    axes: Vec<Vec<Value>>,
    len: usize,
    cursor: usize,
}

impl GridSampler {
    /// Resolves every parameter to its axis of values.
    ///
    /// `n_samples` applies to range parameters without their own override.
    pub fn new(parameters: Vec<GridParameter>, n_samples: usize) -> Result<Self, ScanError> {
        check_names(parameters.iter().map(|param| param.name.as_str()))?;
        let mut names = Vec::with_capacity(parameters.len());
        let mut axes = Vec::with_capacity(parameters.len());
        for param in parameters {
            let axis = match param.spec {
                ParameterSpec::Explicit { values } => {
                    if values.is_empty() {
                        return Err(ScanError::Spec(
                            ErrorInfo::new("values-empty", "explicit value list is empty")
                                .with_context("parameter", param.name),
                        ));
                    }
                    values
                }
                ParameterSpec::Range(range) => {
                    check_bounds(&param.name, range.min, range.max, range.log)?;
                    let count = range.n_samples.unwrap_or(n_samples);
                    if count == 0 {
                        return Err(ScanError::Spec(
                            ErrorInfo::new("n-samples-zero", "sample count must be positive")
                                .with_context("parameter", param.name),
                        ));
                    }
                    gridspace(&range, count).into_iter().map(Value::from).collect()
                }
            };
            names.push(param.name);
            axes.push(axis);
        }
        let len = axes.iter().try_fold(1usize, |acc, axis| acc.checked_mul(axis.len()));
        let len = len.ok_or_else(|| {
            ScanError::Spec(ErrorInfo::new(
                "grid-too-large",
                "number of grid points overflows usize",
            ))
        })?;
        Ok(Self {
            names,
            axes,
            len,
            cursor: 0,
        })
    }

    /// Total number of samples in the grid, independent of the cursor.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples not yet handed out by iteration.
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolved values per parameter, in declaration order.
    pub fn axes(&self) -> &[Vec<Value>] {
        &self.axes
    }

    /// Returns the sample at `index` of the product without moving the cursor.
    pub fn get(&self, index: usize) -> Option<Sample> {
        if index >= self.len {
            return None;
        }
        let mut positions = vec![0; self.axes.len()];
        let mut rest = index;
        for (slot, axis) in positions.iter_mut().zip(&self.axes).rev() {
            *slot = rest % axis.len();
            rest /= axis.len();
        }
        Some(
            self.names
                .iter()
                .zip(&self.axes)
                .zip(positions)
                .map(|((name, axis), position)| (name.clone(), axis[position].clone()))
                .collect(),
        )
    }

    /// Draws the next `num` samples from the shared cursor.
    ///
    /// Returns fewer than `num` samples once the grid runs out, and an empty
    /// vector after that.
    pub fn sample(&mut self, num: usize) -> Vec<Sample> {
        self.by_ref().take(num).collect()
    }

    /// Moves the cursor back to the first sample.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for GridSampler {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let sample = self.get(self.cursor)?;
        self.cursor += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

/// Evenly spaced points over a range, linear or in log10.
///
/// The first point is exactly `min`; with `endpoint` the last is exactly `max`
/// and the step is `range / (count - 1)`, otherwise the step is
/// `range / count` and `max` is excluded.
pub fn gridspace(range: &RangeSpec, count: usize) -> Vec<f64> {
    let (start, stop) = if range.log {
        (range.min.log10(), range.max.log10())
    } else {
        (range.min, range.max)
    };
    let divisions = if range.endpoint {
        count.saturating_sub(1)
    } else {
        count
    };
    let step = if divisions == 0 {
        0.0
    } else {
        (stop - start) / divisions as f64
    };
    (0..count)
        .map(|i| {
            if i == 0 {
                return range.min;
            }
            if range.endpoint && i + 1 == count {
                return range.max;
            }
            let point = start + i as f64 * step;
            if range.log {
                10f64.powf(point)
            } else {
                point
            }
        })
        .collect()
}
