// mod.rs - CLI and configuration module

pub mod args;
pub mod config;
pub mod dataset;
pub mod merge;
pub mod resolve;
pub mod schema;
pub mod validation;

// Re-export main types for convenience
pub use args::{build_command, parse_args, parse_args_from, RawArguments};
pub use config::{get_config, ConfigLoader, ConfigSource, DEFAULT_CONFIG_PATH};
pub use dataset::DatasetSpec;
pub use merge::{deep_merge, override_by_args};
pub use resolve::merge_global_with_individual;
pub use schema::{AnalysisEntry, ClfAlgorithm, DatasetEntry, MethodEntry, ResolvedConfig};
pub use validation::{validate_config, ValidationReport};
