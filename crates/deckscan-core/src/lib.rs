#![deny(missing_docs)]
#![doc = "Shared error surface and deterministic randomness for the deckscan parameter-scan crates."]

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, ScanError};
pub use rng::{derive_substream_seed, RngHandle};
