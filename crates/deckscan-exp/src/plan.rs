use std::fs;
use std::path::{Path, PathBuf};

use deckscan_core::errors::ScanError;
use log::info;
use serde::{Deserialize, Serialize};

use crate::campaign::Campaign;
use crate::deck::DeckFormat;
use crate::grid::{GridSampler, DEFAULT_GRID_SAMPLES};
use crate::hash::stable_hash_string;
use crate::lhs::LatinHypercubeSampler;
use crate::params::{GridParameter, LhsParameter};
use crate::rundir::run_dir_segments;
use crate::serde::{from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
use crate::Sample;

/// File written into the campaign root by [`run_plan`].
pub const REPORT_FILE: &str = "scan_report.json";

/// Sampling strategy of a scan plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanStrategy {
    Grid {
        parameters: Vec<GridParameter>,
        #[serde(default = "ScanStrategy::default_grid_samples")]
        n_samples: usize,
    },
    Lhs {
        parameters: Vec<LhsParameter>,
        samples: usize,
        #[serde(default)]
        seed: u64,
    },
}

impl ScanStrategy {
    const fn default_grid_samples() -> usize {
        DEFAULT_GRID_SAMPLES
    }

    /// Resolves the strategy into its full list of samples.
    pub fn samples(&self) -> Result<Vec<Sample>, ScanError> {
        match self {
            ScanStrategy::Grid {
                parameters,
                n_samples,
            } => Ok(GridSampler::new(parameters.clone(), *n_samples)?.collect()),
            ScanStrategy::Lhs {
                parameters,
                samples,
                seed,
            } => Ok(LatinHypercubeSampler::new(parameters.clone(), *seed)?.sample(*samples)),
        }
    }
}

/// Declarative description of a parameter scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanPlan {
    /// Template configuration; its format follows the file extension.
    pub template: PathBuf,
    /// Root of the run directory hierarchy.
    pub root: PathBuf,
    /// Format of the per-run configuration files.
    #[serde(default)]
    pub format: DeckFormat,
    pub strategy: ScanStrategy,
    /// Directory containing the plan on disk (ignored when serializing).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ScanPlan {
    /// Returns the deterministic hash associated with the plan contents.
    pub fn plan_hash(&self) -> Result<String, ScanError> {
        stable_hash_string(self)
    }

    pub fn to_yaml_string(&self) -> Result<String, ScanError> {
        to_yaml_string(self)
    }

    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template)
    }

    pub fn root_path(&self) -> PathBuf {
        self.resolve(&self.root)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Loads a plan from disk; relative paths resolve against its directory.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<ScanPlan, ScanError> {
    let plan_path = path.as_ref();
    let bytes = fs::read(plan_path).map_err(|err| ScanError::io("plan-read", plan_path, err))?;
    let mut plan: ScanPlan = from_yaml_slice(&bytes)?;
    plan.base_dir = plan_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok(plan)
}

/// One prepared run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub index: u64,
    pub params: Sample,
    /// Run directory relative to the campaign root, `/` separated.
    pub dir: String,
}

/// Manifest of a prepared scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub plan_hash: String,
    pub format: DeckFormat,
    pub config_file: String,
    pub jobs: Vec<ScanJob>,
}

/// Prepares every run of `plan` and writes [`REPORT_FILE`] into the root.
pub fn run_plan(plan: &ScanPlan) -> Result<ScanReport, ScanError> {
    let plan_hash = plan.plan_hash()?;
    let template_path = plan.template_path();
    let template = DeckFormat::from_path(&template_path).read_file(&template_path)?;
    let samples = plan.strategy.samples()?;
    let root = plan.root_path();
    info!(
        "preparing {} runs under {} (plan {})",
        samples.len(),
        root.display(),
        plan_hash
    );
    fs::create_dir_all(&root).map_err(|err| ScanError::io("root-create", &root, err))?;

    let mut campaign = Campaign::with_format(template, root.clone(), plan.format);
    let mut jobs = Vec::with_capacity(samples.len());
    for params in samples {
        let index = campaign.counter();
        campaign.setup_case(&params)?;
        jobs.push(ScanJob {
            index,
            params,
            dir: run_dir_segments(index).join("/"),
        });
    }

    let report = ScanReport {
        plan_hash,
        format: plan.format,
        config_file: plan.format.file_name().to_string(),
        jobs,
    };
    let report_path = root.join(REPORT_FILE);
    fs::write(&report_path, to_canonical_json_bytes(&report)?)
        .map_err(|err| ScanError::io("report-write", &report_path, err))?;
    info!("wrote {}", report_path.display());
    Ok(report)
}

/// Loads a plan from disk and prepares it.
pub fn run_plan_from_path(plan_path: &Path) -> Result<ScanReport, ScanError> {
    let plan = load_plan(plan_path)?;
    run_plan(&plan)
}
