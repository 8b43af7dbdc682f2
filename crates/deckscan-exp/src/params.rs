use std::collections::BTreeSet;

use deckscan_core::errors::{ErrorInfo, ScanError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flatkey::{check_flat_key, check_prefix_clash};

/// How a single grid parameter produces its values.
///
/// An explicit `values` list takes precedence: when it is present any range
/// fields next to it are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSpec {
    /// Values used verbatim, in order.
    Explicit { values: Vec<Value> },
    /// Evenly spaced values between two bounds.
    Range(RangeSpec),
}

/// Range descriptor for a grid parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub min: f64,
    pub max: f64,
    /// Space the points evenly in log10 rather than linearly.
    #[serde(default)]
    pub log: bool,
    /// Per-parameter override of the sampler-wide sample count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_samples: Option<usize>,
    /// Whether `max` itself is part of the grid.
    #[serde(default = "RangeSpec::default_endpoint")]
    pub endpoint: bool,
}

impl RangeSpec {
    const fn default_endpoint() -> bool {
        true
    }

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            log: false,
            n_samples: None,
            endpoint: Self::default_endpoint(),
        }
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = Some(n_samples);
        self
    }

    pub fn with_endpoint(mut self, endpoint: bool) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Named grid parameter; `name` is a flat key such as `"block:var1"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParameter {
    pub name: String,
    #[serde(flatten)]
    pub spec: ParameterSpec,
}

impl GridParameter {
    pub fn range(name: impl Into<String>, range: RangeSpec) -> Self {
        Self {
            name: name.into(),
            spec: ParameterSpec::Range(range),
        }
    }

    pub fn values(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            spec: ParameterSpec::Explicit { values },
        }
    }
}

/// Latin hypercube parameter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LhsParameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Stratify in log space; both bounds must be strictly positive.
    #[serde(default)]
    pub log: bool,
}

impl LhsParameter {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            log: false,
        }
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }
}

fn spec_error(code: &str, message: &str, name: &str) -> ScanError {
    ScanError::Spec(ErrorInfo::new(code, message).with_context("parameter", name.to_string()))
}

/// Rejects empty parameter lists, malformed flat keys, duplicate names and
/// names that are a path prefix of another.
pub(crate) fn check_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), ScanError> {
    let mut seen = BTreeSet::new();
    for name in names {
        check_flat_key(name).map_err(|err| match err {
            ScanError::Spec(info) => ScanError::Spec(info.with_context("parameter", name.to_string())),
            other => other,
        })?;
        if !seen.insert(name) {
            return Err(spec_error(
                "parameter-duplicate",
                "parameter declared more than once",
                name,
            ));
        }
    }
    if seen.is_empty() {
        return Err(ScanError::Spec(ErrorInfo::new(
            "parameters-empty",
            "at least one parameter is required",
        )));
    }
    check_prefix_clash(seen)
}

/// Checks `min < max` (both finite) and strictly positive bounds under `log`.
pub(crate) fn check_bounds(name: &str, min: f64, max: f64, log: bool) -> Result<(), ScanError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(spec_error("range-not-finite", "range bounds must be finite", name));
    }
    if min >= max {
        return Err(ScanError::Spec(
            ErrorInfo::new("range-inverted", "range minimum must be below its maximum")
                .with_context("parameter", name.to_string())
                .with_context("min", min.to_string())
                .with_context("max", max.to_string()),
        ));
    }
    if log && min <= 0.0 {
        return Err(ScanError::Spec(
            ErrorInfo::new("range-log-non-positive", "log ranges need positive bounds")
                .with_context("parameter", name.to_string())
                .with_context("min", min.to_string())
                .with_hint("drop `log` or raise `min` above zero"),
        ));
    }
    Ok(())
}
