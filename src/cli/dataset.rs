// dataset.rs - Normalization of --dataset values into a fixed 7-field spec

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, Result};

pub const DEFAULT_DATASET_FILEPATH: &str = "datasets/test_small.csv";
pub const DEFAULT_DATASET_FILETYPE: &str = "auto";
pub const DEFAULT_DATASET_PROCESSOR: &str = "default";
pub const DEFAULT_DATASET_TEXT_FIELD: &str = "text";
pub const DEFAULT_DATASET_LABEL_FIELD: &str = "label";
pub const DEFAULT_DATASET_HUMAN_LABEL: &str = "0";

/// Maximum number of positional values accepted by one `--dataset` occurrence
pub const MAX_DATASET_VALUES: usize = 7;

/// One dataset as given on the command line:
/// `FILEPATH [FILETYPE [PROCESSOR [TEXT_FIELD [LABEL_FIELD [HUMAN_LABEL [OTHER]]]]]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub filepath: String,
    pub filetype: String,
    pub processor: String,
    pub text_field: String,
    pub label_field: String,
    pub human_label: String,
    pub other: Option<String>,
}

impl DatasetSpec {
    /// Build a spec from 1 to 7 values, filling the missing trailing fields with defaults
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        if values.is_empty() || values.len() > MAX_DATASET_VALUES {
            return Err(ConfigError::InvalidArity {
                got: values.len(),
                max: MAX_DATASET_VALUES,
                values: values.iter().map(|v| v.as_ref().to_string()).collect(),
            });
        }

        let field = |index: usize, default: &str| {
            values
                .get(index)
                .map(|v| v.as_ref().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            filepath: field(0, DEFAULT_DATASET_FILEPATH),
            filetype: field(1, DEFAULT_DATASET_FILETYPE),
            processor: field(2, DEFAULT_DATASET_PROCESSOR),
            text_field: field(3, DEFAULT_DATASET_TEXT_FIELD),
            label_field: field(4, DEFAULT_DATASET_LABEL_FIELD),
            human_label: field(5, DEFAULT_DATASET_HUMAN_LABEL),
            other: values.get(6).map(|v| v.as_ref().to_string()),
        })
    }

    /// Mapping form used for `data.list` entries
    pub fn to_tree(&self) -> Value {
        let mut entry = Mapping::new();
        entry.insert("filepath".into(), self.filepath.clone().into());
        entry.insert("filetype".into(), self.filetype.clone().into());
        entry.insert("processor".into(), self.processor.clone().into());
        entry.insert("text_field".into(), self.text_field.clone().into());
        entry.insert("label_field".into(), self.label_field.clone().into());
        entry.insert("human_label".into(), self.human_label.clone().into());
        entry.insert(
            "dataset_other".into(),
            self.other.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Mapping(entry)
    }

    /// Sequence form stored in `RawArguments` under `dataset`
    pub fn to_values(&self) -> Value {
        Value::Sequence(vec![
            self.filepath.clone().into(),
            self.filetype.clone().into(),
            self.processor.clone().into(),
            self.text_field.clone().into(),
            self.label_field.clone().into(),
            self.human_label.clone().into(),
            self.other.clone().map(Value::String).unwrap_or(Value::Null),
        ])
    }
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            filepath: DEFAULT_DATASET_FILEPATH.to_string(),
            filetype: DEFAULT_DATASET_FILETYPE.to_string(),
            processor: DEFAULT_DATASET_PROCESSOR.to_string(),
            text_field: DEFAULT_DATASET_TEXT_FIELD.to_string(),
            label_field: DEFAULT_DATASET_LABEL_FIELD.to_string(),
            human_label: DEFAULT_DATASET_HUMAN_LABEL.to_string(),
            other: None,
        }
    }
}
