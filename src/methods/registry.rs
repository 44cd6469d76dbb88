// registry.rs - Registry of available detection and analysis methods

use std::collections::BTreeMap;
use std::fmt;

/// Name selecting every registered method
pub const ALL_METHODS: &str = "all";

/// How a method turns a text into a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFamily {
    /// Criterion score from the base model + threshold classifier
    MetricBased,
    /// Score changes under mask-filling perturbations
    PerturbationBased,
    /// Scores returned by an external service
    External,
}

impl fmt::Display for MethodFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MethodFamily::MetricBased => "metric-based",
            MethodFamily::PerturbationBased => "perturbation-based",
            MethodFamily::External => "external",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub family: MethodFamily,
    pub description: String,
}

/// Analyses that can be run over finished experiment results
pub const ANALYSIS_METHODS: &[(&str, &str)] = &[
    ("text_length", "Detection performance grouped by text length"),
    ("false_negatives", "Machine texts the detector labelled as human"),
    ("threshold_scan", "Accuracy of each method across classifier thresholds"),
];

/// Registry for available detection methods
pub struct MethodRegistry {
    methods: BTreeMap<String, MethodInfo>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            methods: BTreeMap::new(),
        };

        // Built-in methods
        registry.register_method("LikelihoodMetric", MethodFamily::MetricBased, "Average token log-likelihood under the base model");
        registry.register_method("RankMetric", MethodFamily::MetricBased, "Average rank of each token in the base model's predictions");
        registry.register_method("LogRankMetric", MethodFamily::MetricBased, "Average log-rank of each token in the base model's predictions");
        registry.register_method("EntropyMetric", MethodFamily::MetricBased, "Average entropy of the base model's predictive distribution");
        registry.register_method("DetectGPT", MethodFamily::PerturbationBased, "Log-probability curvature under T5 mask-filling perturbations");
        registry.register_method("GPTZeroAPI", MethodFamily::External, "Scores from the GPTZero service (requires gptzero_key)");

        registry
    }

    /// Register a new method (replaces an existing one with the same name)
    pub fn register_method(&mut self, name: &str, family: MethodFamily, description: &str) {
        self.methods.insert(
            name.to_string(),
            MethodInfo {
                name: name.to_string(),
                family,
                description: description.to_string(),
            },
        );
    }

    pub fn get_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// All methods as `(name, description)`, sorted by name
    pub fn list_methods(&self) -> Vec<(&str, &str)> {
        self.methods
            .values()
            .map(|m| (m.name.as_str(), m.description.as_str()))
            .collect()
    }

    pub fn get_method_names(&self) -> Vec<&str> {
        self.methods.keys().map(|s| s.as_str()).collect()
    }

    /// Replace `all` with every registered method, keeping order and dropping repeats
    pub fn expand<'a>(&'a self, names: &[&'a str]) -> Result<Vec<&'a str>, String> {
        let mut expanded: Vec<&str> = Vec::new();
        for &name in names {
            let batch = if name == ALL_METHODS {
                self.get_method_names()
            } else if self.has_method(name) {
                vec![name]
            } else {
                return Err(format!(
                    "Unknown method '{}'. Available: {}",
                    name,
                    self.get_method_names().join(", ")
                ));
            };
            for method in batch {
                if !expanded.contains(&method) {
                    expanded.push(method);
                }
            }
        }
        Ok(expanded)
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn has_analysis_method(name: &str) -> bool {
    name == ALL_METHODS || ANALYSIS_METHODS.iter().any(|(n, _)| *n == name)
}
