// resolve.rs - Apply section-wide `global` defaults to every list item

use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, Result};

/// Sections that follow the `global` + `list` layout
pub const RESOLVED_SECTIONS: [&str; 2] = ["data", "methods"];

/// Fold `global` into each `list` item of the `data` and `methods` sections.
///
/// Item keys win over global ones. The `global` keys are removed afterwards.
/// Returns a new tree; `config` is left as it was.
pub fn merge_global_with_individual(config: &Value) -> Result<Value> {
    let mut resolved = config.clone();
    for section in RESOLVED_SECTIONS {
        resolve_section(&mut resolved, section)?;
    }
    Ok(resolved)
}

/// Resolve one section in place
pub fn resolve_section(config: &mut Value, section: &str) -> Result<()> {
    let section_map = config
        .get_mut(section)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| ConfigError::MissingSchemaSection(section.to_string()))?;

    let global = match section_map.remove("global") {
        Some(Value::Mapping(global)) => global,
        Some(Value::Null) | None => Mapping::new(),
        Some(other) => {
            return Err(ConfigError::Validation(format!(
                "'{}.global' must be a mapping, found {:?}",
                section, other
            )))
        }
    };

    let list = section_map
        .get_mut("list")
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| ConfigError::MissingSchemaSection(format!("{}.list", section)))?;

    for (index, item) in list.iter_mut().enumerate() {
        let overrides = item.as_mapping().ok_or_else(|| {
            ConfigError::Validation(format!("'{}.list[{}]' must be a mapping", section, index))
        })?;

        let mut merged = global.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        *item = Value::Mapping(merged);
    }

    Ok(())
}
