use std::fs;
use std::path::{Path, PathBuf};

use deckscan_core::errors::ScanError;
use log::debug;
use serde_json::Value;

use crate::deck::DeckFormat;
use crate::flatkey::expand_flat_sample;
use crate::merge::deep_update;
use crate::rundir::ensure_run_dir;
use crate::Sample;

/// Campaign of runs built from a template configuration.
///
/// Each call to [`Campaign::setup_case`] overlays one flat sample on the
/// template and writes the result into the next run directory under `root`.
/// The run counter lives in the value itself and only advances through
/// `&mut self`, so each campaign hands out indices `0, 1, 2, ...` exactly
/// once.
#[derive(Debug, Clone)]
pub struct Campaign {
    template: Value,
    root: PathBuf,
    format: DeckFormat,
    counter: u64,
}

impl Campaign {
    /// Creates a campaign writing `input.deck` files.
    pub fn new(template: Value, root: impl Into<PathBuf>) -> Self {
        Self::with_format(template, root, DeckFormat::Deck)
    }

    pub fn with_format(template: Value, root: impl Into<PathBuf>, format: DeckFormat) -> Self {
        Self {
            template,
            root: root.into(),
            format,
            counter: 0,
        }
    }

    pub fn template(&self) -> &Value {
        &self.template
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> DeckFormat {
        self.format
    }

    /// Index the next call to [`Campaign::setup_case`] will use.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Creates the run directory for `sample` and writes its configuration.
    ///
    /// The counter only advances once the file is written, so a failed call
    /// can be retried and reuses the same index.
    pub fn setup_case(&mut self, sample: &Sample) -> Result<PathBuf, ScanError> {
        let overlay = expand_flat_sample(sample)?;
        let merged = deep_update(&self.template, &overlay);
        let bytes = self.format.to_bytes(&merged)?;
        let path = ensure_run_dir(&self.root, self.counter)?;
        let file = path.join(self.format.file_name());
        fs::write(&file, bytes).map_err(|err| ScanError::io("config-write", &file, err))?;
        debug!("prepared run {} in {}", self.counter, path.display());
        self.counter += 1;
        Ok(path)
    }
}
