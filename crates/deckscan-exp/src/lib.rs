//! Parameter scans for simulation campaigns.
//!
//! Samplers turn declarative parameter ranges into flat samples keyed by
//! colon paths (`"block:var1"`); a [`Campaign`] overlays each sample on a
//! template configuration and writes it into a bounded fan-out run directory
//! hierarchy.

use std::collections::BTreeMap;

use serde_json::Value;

mod campaign;
pub mod deck;
mod flatkey;
mod grid;
mod hash;
mod lhs;
mod merge;
mod params;
mod plan;
mod rundir;
mod serde;

/// One assignment of values to flat parameter keys.
///
/// Keys iterate in sorted order, not insertion order. Expansion therefore
/// rejects samples where one key is a path prefix of another.
pub type Sample = BTreeMap<String, Value>;

pub use campaign::Campaign;
pub use deck::{parse_deck, render_deck, DeckFormat};
pub use flatkey::{expand_flat_key, expand_flat_sample, FLAT_KEY_SEPARATOR};
pub use grid::{gridspace, GridSampler, DEFAULT_GRID_SAMPLES};
pub use hash::stable_hash_string;
pub use lhs::{unit_hypercube, LatinHypercubeSampler};
pub use merge::{deep_update, deep_update_in_place};
pub use params::{GridParameter, LhsParameter, ParameterSpec, RangeSpec};
pub use plan::{
    load_plan, run_plan, run_plan_from_path, ScanJob, ScanPlan, ScanReport, ScanStrategy,
    REPORT_FILE,
};
pub use rundir::{
    ensure_run_dir, run_dir_path, run_dir_segments, run_index_from_signed, FAN_OUT,
};

pub use crate::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
