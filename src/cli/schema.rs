// schema.rs - Typed view of the resolved configuration

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::error::{ConfigError, Result};

/// Classification algorithm used to turn criterion scores into a decision threshold
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClfAlgorithm {
    #[default]
    LogisticRegression,
    KNeighborsClassifier,
    SVC,
    DecisionTreeClassifier,
    RandomForestClassifier,
    MLPClassifier,
    AdaBoostClassifier,
}

impl ClfAlgorithm {
    pub const ALL: [ClfAlgorithm; 7] = [
        ClfAlgorithm::LogisticRegression,
        ClfAlgorithm::KNeighborsClassifier,
        ClfAlgorithm::SVC,
        ClfAlgorithm::DecisionTreeClassifier,
        ClfAlgorithm::RandomForestClassifier,
        ClfAlgorithm::MLPClassifier,
        ClfAlgorithm::AdaBoostClassifier,
    ];

    pub const NAMES: [&'static str; 7] = [
        "LogisticRegression",
        "KNeighborsClassifier",
        "SVC",
        "DecisionTreeClassifier",
        "RandomForestClassifier",
        "MLPClassifier",
        "AdaBoostClassifier",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClfAlgorithm::LogisticRegression => "LogisticRegression",
            ClfAlgorithm::KNeighborsClassifier => "KNeighborsClassifier",
            ClfAlgorithm::SVC => "SVC",
            ClfAlgorithm::DecisionTreeClassifier => "DecisionTreeClassifier",
            ClfAlgorithm::RandomForestClassifier => "RandomForestClassifier",
            ClfAlgorithm::MLPClassifier => "MLPClassifier",
            ClfAlgorithm::AdaBoostClassifier => "AdaBoostClassifier",
        }
    }
}

impl FromStr for ClfAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|algo| algo.as_str() == s)
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unknown classification algorithm '{}'. Available: {}",
                    s,
                    Self::NAMES.join(", ")
                )
            })
    }
}

impl fmt::Display for ClfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final configuration handed to the experiments.
///
/// Same shape as the YAML document, but `data.global` and `methods.global`
/// are gone and every list item carries the global values it did not override.
/// Top-level keys outside the three known sections are kept in `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub data: DataSection,
    pub methods: MethodsSection,
    #[serde(default)]
    pub analysis: Vec<AnalysisEntry>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    pub list: Vec<DatasetEntry>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodsSection {
    pub list: Vec<MethodEntry>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub filepath: String,
    #[serde(default = "default_filetype", deserialize_with = "scalar_string")]
    pub filetype: String,
    #[serde(default = "default_processor", deserialize_with = "scalar_string")]
    pub processor: String,
    #[serde(default = "default_text_field", deserialize_with = "scalar_string")]
    pub text_field: String,
    #[serde(default = "default_label_field", deserialize_with = "scalar_string")]
    pub label_field: String,
    /// Label value marking human-written texts (YAML may spell it as a number)
    #[serde(default = "default_human_label", deserialize_with = "scalar_string")]
    pub human_label: String,
    #[serde(default)]
    pub dataset_other: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub clf_algo_for_threshold: Option<ClfAlgoSpec>,
    /// Every other method parameter (batch_size, DEVICE, perturbation settings...)
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClfAlgoSpec {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub name: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

impl ResolvedConfig {
    /// Type a resolved tree
    pub fn from_tree(tree: Value) -> Result<Self> {
        serde_yaml::from_value(tree).map_err(ConfigError::Schema)
    }

    /// Back to the untyped YAML tree
    pub fn to_tree(&self) -> Result<Value> {
        serde_yaml::to_value(self).map_err(ConfigError::Schema)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ConfigError::Schema)
    }

    /// Run name given with `--name` or in the config file
    pub fn name(&self) -> Option<&str> {
        self.other.get("name").and_then(Value::as_str)
    }

    /// Top-level boolean such as `list_methods` (false when absent)
    pub fn switch(&self, key: &str) -> bool {
        self.other.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn datasets(&self) -> &[DatasetEntry] {
        &self.data.list
    }

    pub fn method_entries(&self) -> &[MethodEntry] {
        &self.methods.list
    }

    pub fn analysis_names(&self) -> Vec<&str> {
        self.analysis.iter().map(|a| a.name.as_str()).collect()
    }
}

impl MethodEntry {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }

    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(Value::as_i64)
    }

    pub fn float_param(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(Value::as_f64)
    }

    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(Value::as_bool)
    }

    /// Threshold classifier for this method (LogisticRegression when unset)
    pub fn clf_algorithm(&self) -> Result<ClfAlgorithm> {
        match &self.clf_algo_for_threshold {
            Some(spec) => spec.name.parse().map_err(ConfigError::Validation),
            None => Ok(ClfAlgorithm::default()),
        }
    }
}

fn default_filetype() -> String {
    super::dataset::DEFAULT_DATASET_FILETYPE.to_string()
}

fn default_processor() -> String {
    super::dataset::DEFAULT_DATASET_PROCESSOR.to_string()
}

fn default_text_field() -> String {
    super::dataset::DEFAULT_DATASET_TEXT_FIELD.to_string()
}

fn default_label_field() -> String {
    super::dataset::DEFAULT_DATASET_LABEL_FIELD.to_string()
}

fn default_human_label() -> String {
    super::dataset::DEFAULT_DATASET_HUMAN_LABEL.to_string()
}

/// Accept any YAML scalar where a string is expected (`human_label: 0`)
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clf_algorithm_names() {
        for (algo, name) in ClfAlgorithm::ALL.iter().zip(ClfAlgorithm::NAMES) {
            assert_eq!(algo.as_str(), name);
            assert_eq!(name.parse::<ClfAlgorithm>().unwrap(), *algo);
        }
        assert!("NaiveBayes".parse::<ClfAlgorithm>().is_err());
        assert_eq!(ClfAlgorithm::default(), ClfAlgorithm::LogisticRegression);
    }

    #[test]
    fn test_typed_view_of_resolved_tree() {
        let tree: Value = serde_yaml::from_str(
            r#"
name: run-1
data:
  list:
    - filepath: a.csv
      human_label: 0
      test_size: 0.2
methods:
  list:
    - name: LogRankMetric
      DEVICE: cpu
      batch_size: 8
      clf_algo_for_threshold:
        name: SVC
analysis:
  - name: all
"#,
        )
        .unwrap();

        let config = ResolvedConfig::from_tree(tree).unwrap();
        assert_eq!(config.name(), Some("run-1"));

        let dataset = &config.datasets()[0];
        assert_eq!(dataset.filepath, "a.csv");
        assert_eq!(dataset.filetype, "auto");
        assert_eq!(dataset.human_label, "0");
        assert_eq!(dataset.extra.get("test_size"), Some(&Value::from(0.2)));

        let method = &config.method_entries()[0];
        assert_eq!(method.str_param("DEVICE"), Some("cpu"));
        assert_eq!(method.int_param("batch_size"), Some(8));
        assert_eq!(method.clf_algorithm().unwrap(), ClfAlgorithm::SVC);
        assert_eq!(config.analysis_names(), vec!["all"]);
    }

    #[test]
    fn test_unknown_clf_algorithm_is_validation_error() {
        let method = MethodEntry {
            name: "RankMetric".to_string(),
            clf_algo_for_threshold: Some(ClfAlgoSpec { name: "Perceptron".to_string() }),
            params: BTreeMap::new(),
        };
        assert!(matches!(method.clf_algorithm(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_list_is_schema_error() {
        let tree: Value = serde_yaml::from_str("data: {}\nmethods:\n  list: []\n").unwrap();
        assert!(matches!(ResolvedConfig::from_tree(tree), Err(ConfigError::Schema(_))));
    }
}
