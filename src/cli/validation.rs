// validation.rs - Checks on the resolved configuration before experiments start

use std::path::Path;

use log::warn;

use crate::cli::ResolvedConfig;
use crate::error::{ConfigError, Result};
use crate::methods::registry::{has_analysis_method, MethodFamily, MethodRegistry, ANALYSIS_METHODS, ALL_METHODS};

/// What the run will actually execute
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Method names with `all` expanded
    pub methods: Vec<String>,
    /// Analysis names with `all` expanded
    pub analysis: Vec<String>,
    pub datasets: Vec<String>,
    /// Problems that do not stop the run
    pub warnings: Vec<String>,
}

/// Validate the resolved configuration. The configuration itself is not changed.
pub fn validate_config(config: &ResolvedConfig) -> Result<ValidationReport> {
    let registry = MethodRegistry::new();
    let mut warnings = Vec::new();

    // Datasets
    let mut datasets = Vec::new();
    for (index, dataset) in config.datasets().iter().enumerate() {
        if dataset.filepath.trim().is_empty() {
            return Err(ConfigError::Validation(format!("data.list[{}] has an empty filepath", index)));
        }
        if !Path::new(&dataset.filepath).exists() {
            warnings.push(format!("Dataset file '{}' does not exist", dataset.filepath));
        }
        datasets.push(dataset.filepath.clone());
    }

    // Methods
    let mut requested = Vec::new();
    for method in config.method_entries() {
        method.clf_algorithm()?;
        if let Some(batch_size) = method.int_param("batch_size") {
            if batch_size <= 0 {
                return Err(ConfigError::Validation(format!(
                    "batch_size must be positive for method '{}', got {}",
                    method.name, batch_size
                )));
            }
        }
        requested.push(method.name.as_str());
    }
    let methods = registry.expand(&requested).map_err(ConfigError::Validation)?;

    let gptzero_without_key = methods
        .iter()
        .filter_map(|name| registry.get_method(name))
        .any(|info| info.family == MethodFamily::External)
        && !config
            .method_entries()
            .iter()
            .any(|m| m.str_param("gptzero_key").is_some_and(|key| !key.is_empty()));
    if gptzero_without_key {
        warnings.push("GPTZeroAPI selected but gptzero_key is empty; it will be skipped".to_string());
    }

    // Analysis
    let mut analysis: Vec<String> = Vec::new();
    for name in config.analysis_names() {
        if !has_analysis_method(name) {
            return Err(ConfigError::Validation(format!(
                "Unknown analysis method '{}'. Available: {}",
                name,
                ANALYSIS_METHODS.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
            )));
        }
        let batch: Vec<&str> = if name == ALL_METHODS {
            ANALYSIS_METHODS.iter().map(|(n, _)| *n).collect()
        } else {
            vec![name]
        };
        for item in batch {
            if !analysis.iter().any(|a| a == item) {
                analysis.push(item.to_string());
            }
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(ValidationReport {
        methods: methods.into_iter().map(str::to_string).collect(),
        analysis,
        datasets,
        warnings,
    })
}
