// config.rs - Configuration loading: command line or YAML file, always over the baseline

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_yaml::{Mapping, Value};

use super::args::{parse_args, RawArguments};
use super::merge::{deep_merge, override_by_args};
use super::resolve::merge_global_with_individual;
use super::schema::ResolvedConfig;
use crate::error::{ConfigError, Result};

/// Baseline document defining the full schema with default values
pub const DEFAULT_CONFIG_PATH: &str = "config/default_config.yaml";

/// Where the configuration of a run comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Flags merged over the baseline
    CommandLine,
    /// `--from_config` file merged over the baseline; every other flag is ignored
    FromFile,
}

impl ConfigSource {
    pub fn of(args: &RawArguments) -> Self {
        if args.from_config().is_some() {
            ConfigSource::FromFile
        } else {
            ConfigSource::CommandLine
        }
    }
}

/// Builds a `ResolvedConfig` from raw arguments, starting each time from a
/// freshly read baseline.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    baseline_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_baseline(DEFAULT_CONFIG_PATH)
    }

    pub fn with_baseline<P: Into<PathBuf>>(baseline_path: P) -> Self {
        Self {
            baseline_path: baseline_path.into(),
        }
    }

    pub fn baseline_path(&self) -> &Path {
        &self.baseline_path
    }

    /// Read the baseline document. A missing baseline is fatal.
    pub fn load_baseline(&self) -> Result<Value> {
        read_yaml(&self.baseline_path)
    }

    /// Pick the file path or the command line path and resolve the configuration
    pub fn load(&self, args: &RawArguments) -> Result<ResolvedConfig> {
        match (ConfigSource::of(args), args.from_config()) {
            (ConfigSource::FromFile, Some(path)) => self.from_yaml_config(path),
            _ => self.from_args(args),
        }
    }

    /// Command line path: flags over the baseline, then lists built from the flags
    pub fn from_args(&self, args: &RawArguments) -> Result<ResolvedConfig> {
        info!("Building configuration from command line arguments");
        let baseline = self.load_baseline()?;
        let mut config = override_by_args(&baseline, args);

        let datasets = args.datasets().iter().map(|spec| spec.to_tree()).collect();
        section_mut(&mut config, "data")?.insert("list".into(), Value::Sequence(datasets));

        root_mut(&mut config)?.insert("analysis".into(), named_entries(&args.analysis_methods()));

        let methods = section_mut(&mut config, "methods")?;
        methods.insert("list".into(), named_entries(&args.methods()));

        let mut clf = Mapping::new();
        clf.insert("name".into(), args.clf_algo_for_threshold().into());
        if !methods.get("global").is_some_and(Value::is_mapping) {
            methods.insert("global".into(), Value::Mapping(Mapping::new()));
        }
        if let Some(Value::Mapping(global)) = methods.get_mut("global") {
            global.insert("clf_algo_for_threshold".into(), Value::Mapping(clf));
        }

        let resolved = merge_global_with_individual(&config)?;
        ResolvedConfig::from_tree(resolved)
    }

    /// File path: user document deep-merged over the baseline
    pub fn from_yaml_config<P: AsRef<Path>>(&self, path: P) -> Result<ResolvedConfig> {
        let path = path.as_ref();
        let user = match read_yaml(path)? {
            Value::Null => {
                warn!("Config file '{}' is empty, using defaults only", path.display());
                Value::Mapping(Mapping::new())
            }
            user @ Value::Mapping(_) => user,
            _ => {
                return Err(ConfigError::Validation(format!(
                    "config file '{}' must contain a mapping at the top level",
                    path.display()
                )))
            }
        };

        let baseline = self.load_baseline()?;
        let merged = deep_merge(&baseline, &user);
        let resolved = merge_global_with_individual(&merged)?;
        ResolvedConfig::from_tree(resolved)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the process arguments and return the resolved configuration
pub fn get_config() -> Result<ResolvedConfig> {
    let args = parse_args()?;
    ConfigLoader::new().load(&args)
}

/// Read a YAML document from disk
pub fn read_yaml<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Loaded configuration from: {}", path.display());
    Ok(value)
}

impl ResolvedConfig {
    /// Load a previously saved resolved configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_tree(read_yaml(path)?)
    }

    /// Save the resolved configuration as YAML
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_yaml_string()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Saved configuration to: {}", path.display());
        Ok(())
    }
}

fn root_mut(config: &mut Value) -> Result<&mut Mapping> {
    config
        .as_mapping_mut()
        .ok_or_else(|| ConfigError::Validation("baseline configuration must be a mapping".to_string()))
}

fn section_mut<'a>(config: &'a mut Value, section: &str) -> Result<&'a mut Mapping> {
    root_mut(config)?
        .get_mut(section)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| ConfigError::MissingSchemaSection(section.to_string()))
}

/// `[a, b]` -> `[{name: a}, {name: b}]`
fn named_entries(names: &[String]) -> Value {
    Value::Sequence(
        names
            .iter()
            .map(|name| {
                let mut entry = Mapping::new();
                entry.insert("name".into(), name.clone().into());
                Value::Mapping(entry)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::parse_args_from;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASELINE: &str = r#"
name: null
data:
  global:
    filetype: auto
    processor: default
    text_field: text
    label_field: label
    human_label: "0"
    dataset_other: null
  list:
    - filepath: datasets/test_small.csv
methods:
  global:
    batch_size: 16
    DEVICE: cuda
    clf_algo_for_threshold:
      name: LogisticRegression
  list:
    - name: all
analysis:
  - name: all
"#;

    fn write_yaml(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn args(list: &[&str]) -> RawArguments {
        parse_args_from(std::iter::once("mgt-detect").chain(list.iter().copied())).unwrap()
    }

    #[test]
    fn test_source_selection() {
        assert_eq!(ConfigSource::of(&args(&[])), ConfigSource::CommandLine);
        assert_eq!(ConfigSource::of(&args(&["--from_config", "x.yaml"])), ConfigSource::FromFile);
    }

    #[test]
    fn test_command_line_path() {
        let baseline = write_yaml(BASELINE);
        let loader = ConfigLoader::with_baseline(baseline.path());
        let config = loader
            .load(&args(&[
                "--dataset", "a.csv", "csv",
                "--methods", "RankMetric", "LogRankMetric",
                "--batch_size", "4",
                "--clf_algo_for_threshold", "SVC",
                "--analysis_methods",
            ]))
            .unwrap();

        assert_eq!(config.datasets().len(), 1);
        assert_eq!(config.datasets()[0].filepath, "a.csv");
        assert_eq!(config.datasets()[0].filetype, "csv");

        let names: Vec<&str> = config.method_entries().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["RankMetric", "LogRankMetric"]);
        for method in config.method_entries() {
            assert_eq!(method.int_param("batch_size"), Some(4));
            assert_eq!(method.clf_algo_for_threshold.as_ref().unwrap().name, "SVC");
        }
        assert!(config.analysis.is_empty());
        assert!(!config.methods.extra.contains_key("global"));
        assert!(!config.data.extra.contains_key("global"));
    }

    #[test]
    fn test_file_path_ignores_other_flags() {
        let baseline = write_yaml(BASELINE);
        let user = write_yaml("methods:\n  global:\n    DEVICE: cpu\n  list:\n    - name: RankMetric\n      batch_size: 2\n");
        let loader = ConfigLoader::with_baseline(baseline.path());
        let path = user.path().to_str().unwrap();

        let first = loader.load(&args(&["--from_config", path, "--batch_size", "1"])).unwrap();
        let second = loader.load(&args(&["--from_config", path, "--batch_size", "99"])).unwrap();
        assert_eq!(first, second);

        let method = &first.method_entries()[0];
        assert_eq!(method.name, "RankMetric");
        assert_eq!(method.int_param("batch_size"), Some(2));
        assert_eq!(method.str_param("DEVICE"), Some("cpu"));
        assert_eq!(first.datasets()[0].filepath, "datasets/test_small.csv");
    }

    #[test]
    fn test_empty_user_file_uses_baseline() {
        let baseline = write_yaml(BASELINE);
        let user = write_yaml("");
        let loader = ConfigLoader::with_baseline(baseline.path());
        let config = loader.from_yaml_config(user.path()).unwrap();
        assert_eq!(config.method_entries()[0].name, "all");
    }

    #[test]
    fn test_missing_files() {
        let loader = ConfigLoader::with_baseline("/nonexistent/default_config.yaml");
        assert!(matches!(loader.from_args(&args(&[])), Err(ConfigError::Io { .. })));

        let baseline = write_yaml(BASELINE);
        let loader = ConfigLoader::with_baseline(baseline.path());
        assert!(matches!(
            loader.from_yaml_config("/nonexistent/user.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let baseline = write_yaml(BASELINE);
        let user = write_yaml("methods: [unclosed");
        let loader = ConfigLoader::with_baseline(baseline.path());
        assert!(matches!(loader.from_yaml_config(user.path()), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_user_file_without_methods_list() {
        let baseline = write_yaml("data:\n  list: []\nmethods:\n  global: {}\n");
        let user = write_yaml("name: x\n");
        let loader = ConfigLoader::with_baseline(baseline.path());
        assert!(matches!(
            loader.from_yaml_config(user.path()),
            Err(ConfigError::MissingSchemaSection(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let baseline = write_yaml(BASELINE);
        let loader = ConfigLoader::with_baseline(baseline.path());
        let config = loader.load(&args(&["--name", "run-7"])).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("resolved.yaml");
        config.to_file(&path).unwrap();
        assert_eq!(ResolvedConfig::from_file(&path).unwrap(), config);
    }
}
