// End-to-end configuration resolution against the shipped baseline

use std::fs;

use mgt_detect::prelude::*;
use serde_yaml::Value;

const BASELINE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default_config.yaml");

fn load(argv: &[&str]) -> ResolvedConfig {
    let mut full = vec!["mgt-detect"];
    full.extend_from_slice(argv);
    let args = parse_args_from(full).unwrap();
    ConfigLoader::with_baseline(BASELINE).load(&args).unwrap()
}

#[test]
fn test_no_flags_uses_defaults() {
    let config = load(&[]);

    assert_eq!(config.datasets().len(), 1);
    let dataset = &config.datasets()[0];
    assert_eq!(dataset.filepath, "datasets/test_small.csv");
    assert_eq!(dataset.filetype, "auto");
    assert_eq!(dataset.processor, "default");
    assert_eq!(dataset.text_field, "text");
    assert_eq!(dataset.label_field, "label");
    assert_eq!(dataset.human_label, "0");

    assert_eq!(config.method_entries().len(), 1);
    let method = &config.method_entries()[0];
    assert_eq!(method.name, "all");
    assert_eq!(method.int_param("batch_size"), Some(16));
    assert_eq!(method.str_param("base_model_name"), Some("gpt2-medium"));
    assert_eq!(method.str_param("DEVICE"), Some("cuda"));
    assert_eq!(method.clf_algorithm().unwrap(), ClfAlgorithm::LogisticRegression);

    assert_eq!(config.analysis_names(), vec!["all"]);
    assert!(!config.switch("list_methods"));

    let tree = config.to_tree().unwrap();
    assert!(tree["data"].get("global").is_none());
    assert!(tree["methods"].get("global").is_none());
}

#[test]
fn test_flags_reach_every_method() {
    let config = load(&[
        "--methods",
        "RankMetric",
        "DetectGPT",
        "--batch_size",
        "4",
        "--DEVICE",
        "cpu",
        "--clf_algo_for_threshold",
        "SVC",
        "--analysis_methods",
        "text_length",
    ]);

    let names: Vec<&str> = config.method_entries().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["RankMetric", "DetectGPT"]);
    for method in config.method_entries() {
        assert_eq!(method.int_param("batch_size"), Some(4));
        assert_eq!(method.str_param("DEVICE"), Some("cpu"));
        assert_eq!(method.clf_algorithm().unwrap(), ClfAlgorithm::SVC);
    }
    assert_eq!(config.analysis_names(), vec!["text_length"]);

    let report = validate_config(&config).unwrap();
    assert_eq!(report.methods, vec!["RankMetric".to_string(), "DetectGPT".to_string()]);
}

#[test]
fn test_given_dataset_replaces_default() {
    let single = load(&["--dataset", "data/hc3.csv", "csv"]);
    assert_eq!(single.datasets().len(), 1);
    assert_eq!(single.datasets()[0].filepath, "data/hc3.csv");
    assert_eq!(single.datasets()[0].filetype, "csv");
    assert_eq!(single.datasets()[0].processor, "default");

    let double = load(&["--dataset", "a.csv", "--dataset", "b.jsonl", "json", "hc3"]);
    let paths: Vec<&str> = double.datasets().iter().map(|d| d.filepath.as_str()).collect();
    assert_eq!(paths, vec!["a.csv", "b.jsonl"]);
    assert_eq!(double.datasets()[1].processor, "hc3");
}

#[test]
fn test_from_config_ignores_other_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.yaml");
    fs::write(
        &path,
        r#"
name: file-run
data:
  list:
    - filepath: data/a.csv
      human_label: 1
methods:
  global:
    DEVICE: cpu
  list:
    - name: LogRankMetric
    - name: RankMetric
      batch_size: 2
"#,
    )
    .unwrap();

    let config = load(&["--from_config", path.to_str().unwrap(), "--batch_size", "99"]);

    assert_eq!(config.name(), Some("file-run"));
    assert_eq!(config.datasets()[0].human_label, "1");
    assert_eq!(config.datasets()[0].filetype, "auto");

    let log_rank = &config.method_entries()[0];
    assert_eq!(log_rank.int_param("batch_size"), Some(16));
    assert_eq!(log_rank.str_param("DEVICE"), Some("cpu"));
    assert_eq!(log_rank.str_param("mask_filling_model_name"), Some("t5-large"));

    let rank = &config.method_entries()[1];
    assert_eq!(rank.int_param("batch_size"), Some(2));

    // Baseline analysis survives when the file does not mention it
    assert_eq!(config.analysis_names(), vec!["all"]);
}

#[test]
fn test_resolved_config_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let config = load(&["--name", "reload", "--methods", "EntropyMetric"]);

    let saved = save_resolved_config(dir.path(), &config).unwrap();
    assert_eq!(saved, dir.path().join("reload.config.yaml"));

    let reloaded = ResolvedConfig::from_file(&saved).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.to_tree().unwrap()["name"], Value::from("reload"));
}
