// lib.rs - mgt-detect library root

//! # mgt-detect - Machine-generated text detection experiments
//!
//! Texts are scored with a numeric criterion taken from a reference language
//! model (token rank, log-likelihood, ...) and a simple classifier separates
//! human from machine texts using those scores.
//!
//! Most of this crate is about configuration: command line flags, repeatable
//! `--dataset` specs and YAML override files are turned into one
//! [`ResolvedConfig`] that every experiment reads.
//!
//! ## Features
//!
//! - **Two input paths**: flags over the baseline, or a YAML file over the baseline
//! - **Global defaults**: `data.global` / `methods.global` apply to every list item
//! - **Typed result**: the resolved tree is checked against a typed schema
//! - **Reproducible**: the resolved configuration round-trips through YAML
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use mgt_detect::prelude::*;
//!
//! let args = parse_args_from(["mgt-detect", "--dataset", "data/hc3.csv", "csv", "--methods", "LogRankMetric"])?;
//! let config = ConfigLoader::new().load(&args)?;
//! let report = validate_config(&config)?;
//!
//! for method in config.method_entries() {
//!     println!("{} on {:?}", method.name, method.str_param("DEVICE"));
//! }
//! println!("{} datasets", report.datasets.len());
//! # Ok::<(), mgt_detect::ConfigError>(())
//! ```

pub mod cli;
pub mod error;
pub mod methods;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{get_config, parse_args, parse_args_from, validate_config};
    pub use crate::cli::{ClfAlgorithm, ConfigLoader, ConfigSource, DatasetSpec, RawArguments};
    pub use crate::cli::{DatasetEntry, MethodEntry, ResolvedConfig, ValidationReport};
    pub use crate::error::{ConfigError, Result};
    pub use crate::methods::{Criterion, ExperimentData, MetricBasedExperiment, MethodRegistry, ThresholdClassifier};
    pub use crate::output::{save_resolved_config, save_results};
}

// Re-export main types at the root level for convenience
pub use cli::{get_config, ConfigLoader, RawArguments, ResolvedConfig};
pub use error::ConfigError;
pub use methods::MethodRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!("mgt-detect v{} - Machine-generated text detection experiments", VERSION)
}
