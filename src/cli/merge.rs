// merge.rs - Merge configuration trees with each other and with CLI arguments

use log::debug;
use serde_yaml::Value;

use crate::cli::RawArguments;

/// Deep-merge `update` over `base` and return the result; neither input is touched.
///
/// Nested mappings are merged key by key. Any other value in `update`, lists
/// included, replaces the value in `base` as a whole. Keys missing from
/// `update` keep their `base` value.
pub fn deep_merge(base: &Value, update: &Value) -> Value {
    let mut merged = base.clone();
    deep_merge_into(&mut merged, update);
    merged
}

fn deep_merge_into(base: &mut Value, update: &Value) {
    match (base, update) {
        (Value::Mapping(base_map), Value::Mapping(update_map)) => {
            for (key, update_val) in update_map {
                let both_mappings =
                    update_val.is_mapping() && base_map.get(key).is_some_and(Value::is_mapping);

                if both_mappings {
                    if let Some(base_val) = base_map.get_mut(key) {
                        deep_merge_into(base_val, update_val);
                    }
                } else {
                    base_map.insert(key.clone(), update_val.clone());
                }
            }
        }
        (base, update) => *base = update.clone(),
    }
}

/// Overwrite every leaf of `config` whose key matches a command line flag name.
///
/// Only nested mappings are walked (lists are left alone) and keys are matched by
/// bare name, whatever their depth. Two unrelated keys with the same name are
/// therefore both overwritten by one flag: `--name` also hits
/// `methods.global.clf_algo_for_threshold.name`.
pub fn override_by_args(config: &Value, args: &RawArguments) -> Value {
    let mut merged = config.clone();
    override_leaves(&mut merged, args);
    merged
}

fn override_leaves(config: &mut Value, args: &RawArguments) {
    if let Value::Mapping(map) = config {
        for (key, value) in map.iter_mut() {
            if value.is_mapping() {
                override_leaves(value, args);
            } else if let Some((name, arg)) = key.as_str().and_then(|k| args.get(k).map(|v| (k, v))) {
                debug!("Overriding '{}' from command line: {:?} -> {:?}", name, value, arg);
                *value = arg.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DatasetSpec;
    use std::collections::BTreeMap;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn raw_args(pairs: &[(&str, Value)]) -> RawArguments {
        let values: BTreeMap<String, Value> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        RawArguments::new(values, vec![DatasetSpec::default()])
    }

    #[test]
    fn test_deep_merge_right_biased_per_leaf() {
        let merged = deep_merge(&yaml("a: {b: 1, c: 2}"), &yaml("a: {b: 9}"));
        assert_eq!(merged, yaml("a: {b: 9, c: 2}"));
    }

    #[test]
    fn test_deep_merge_replaces_lists() {
        let merged = deep_merge(&yaml("x: [1, 2]"), &yaml("x: [3]"));
        assert_eq!(merged, yaml("x: [3]"));
    }

    #[test]
    fn test_deep_merge_adds_new_keys_and_leaves_inputs() {
        let base = yaml("a: {b: 1}\nkeep: true");
        let update = yaml("a: {d: {e: 5}}\nnew: x");
        let merged = deep_merge(&base, &update);

        assert_eq!(merged, yaml("a: {b: 1, d: {e: 5}}\nkeep: true\nnew: x"));
        assert_eq!(base, yaml("a: {b: 1}\nkeep: true"));
    }

    #[test]
    fn test_deep_merge_mapping_replaces_scalar() {
        let merged = deep_merge(&yaml("a: 1"), &yaml("a: {b: 2}"));
        assert_eq!(merged, yaml("a: {b: 2}"));

        let merged = deep_merge(&yaml("a: {b: 2}"), &yaml("a: null"));
        assert_eq!(merged, yaml("a: null"));
    }

    #[test]
    fn test_override_by_args_any_depth() {
        let config = yaml("batch_size: 1\nmethods:\n  global:\n    batch_size: 2\n    DEVICE: cuda\n    top_k: 40");
        let args = raw_args(&[("batch_size", Value::from(64)), ("DEVICE", Value::from("cpu"))]);

        let merged = override_by_args(&config, &args);
        assert_eq!(
            merged,
            yaml("batch_size: 64\nmethods:\n  global:\n    batch_size: 64\n    DEVICE: cpu\n    top_k: 40")
        );
    }

    #[test]
    fn test_override_by_args_skips_lists() {
        let config = yaml("data:\n  list:\n    - filepath: a.csv\n      processor: x");
        let args = raw_args(&[("processor", Value::from("y"))]);
        assert_eq!(override_by_args(&config, &args), config);
    }

    #[test]
    fn test_override_by_args_name_collision() {
        let config = yaml("name: run\nmethods:\n  global:\n    clf_algo_for_threshold:\n      name: SVC");
        let args = raw_args(&[("name", Value::Null)]);

        let merged = override_by_args(&config, &args);
        assert_eq!(
            merged,
            yaml("name: null\nmethods:\n  global:\n    clf_algo_for_threshold:\n      name: null")
        );
    }
}
