// args.rs - Command line arguments definition and collection

use std::collections::BTreeMap;
use std::ffi::OsString;

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_yaml::Value;

use super::dataset::DatasetSpec;
use super::schema::ClfAlgorithm;
use crate::error::Result;

/// How a flag's value is parsed and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagKind {
    /// Present or absent, stored as a bool
    Switch,
    Text,
    Integer,
    Float,
    /// One or more values (`min_values` may be 0)
    List { min_values: usize },
}

struct FlagDef {
    name: &'static str,
    short: Option<char>,
    kind: FlagKind,
    default: &'static [&'static str],
    help: &'static str,
}

const fn flag(name: &'static str, kind: FlagKind, default: &'static [&'static str], help: &'static str) -> FlagDef {
    FlagDef { name, short: None, kind, default, help }
}

/// Every flag except `--dataset` and `--clf_algo_for_threshold`, which need custom handling
const FLAGS: &[FlagDef] = &[
    FlagDef {
        name: "interactive",
        short: Some('i'),
        kind: FlagKind::Switch,
        default: &[],
        help: "run in interactive mode",
    },
    flag("name", FlagKind::Text, &[], "custom name for the results log save file"),
    flag(
        "from_config",
        FlagKind::Text,
        &[],
        "read all parameters from this YAML config file instead of the command line",
    ),
    flag("list_datasets", FlagKind::Switch, &[], "list available dataset files and exit"),
    flag(
        "methods",
        FlagKind::List { min_values: 1 },
        &["all"],
        "names of the detection methods to run",
    ),
    flag("list_methods", FlagKind::Switch, &[], "list names of all available methods and exit"),
    flag("batch_size", FlagKind::Integer, &["16"], "batch size for model inference"),
    flag("base_model_name", FlagKind::Text, &["gpt2-medium"], "reference generative model"),
    flag("mask_filling_model_name", FlagKind::Text, &["t5-large"], "mask filling model for perturbations"),
    flag("cache_dir", FlagKind::Text, &[".cache"], "directory for downloaded models"),
    flag(
        "DEVICE",
        FlagKind::Text,
        &["cuda"],
        "device to run the computations on (e.g. cuda, cpu)",
    ),
    // Perturbation-based detection (DetectGPT family)
    flag("pct_words_masked", FlagKind::Float, &["0.3"], "fraction of words masked per perturbation"),
    flag("span_length", FlagKind::Integer, &["2"], "length of masked spans"),
    flag("n_perturbations", FlagKind::Integer, &["10"], "number of perturbations per text"),
    flag("n_perturbation_rounds", FlagKind::Integer, &["1"], "number of perturbation rounds"),
    flag("chunk_size", FlagKind::Integer, &["20"], "texts per mask filling chunk"),
    flag("n_similarity_samples", FlagKind::Integer, &["20"], "number of similarity samples"),
    flag("int8", FlagKind::Switch, &[], "load models in int8"),
    flag("half", FlagKind::Switch, &[], "load models in half precision"),
    flag("do_top_k", FlagKind::Switch, &[], "use top-k sampling"),
    flag("top_k", FlagKind::Integer, &["40"], "k for top-k sampling"),
    flag("do_top_p", FlagKind::Switch, &[], "use nucleus sampling"),
    flag("top_p", FlagKind::Float, &["0.96"], "p for nucleus sampling"),
    flag("buffer_size", FlagKind::Integer, &["1"], "buffer size for mask filling"),
    flag("mask_top_p", FlagKind::Float, &["1.0"], "p for nucleus sampling while mask filling"),
    flag("random_fills", FlagKind::Switch, &[], "fill masks with random words"),
    flag("random_fills_tokens", FlagKind::Switch, &[], "fill masks with random tokens"),
    // External scoring service
    flag("gptzero_key", FlagKind::Text, &[""], "API key for the GPTZero service"),
    flag(
        "analysis_methods",
        FlagKind::List { min_values: 0 },
        &["all"],
        "names of the analysis methods to run",
    ),
    flag(
        "list_analysis_methods",
        FlagKind::Switch,
        &[],
        "list names of all available analysis methods and exit",
    ),
];

/// Flat view of the command line: one entry per declared flag.
///
/// Unset flags without a default are present with a null value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArguments {
    values: BTreeMap<String, Value>,
    datasets: Vec<DatasetSpec>,
}

impl RawArguments {
    /// Build from already collected values (mostly useful in tests)
    pub fn new(values: BTreeMap<String, Value>, datasets: Vec<DatasetSpec>) -> Self {
        let mut values = values;
        values.insert(
            "dataset".to_string(),
            Value::Sequence(datasets.iter().map(DatasetSpec::to_values).collect()),
        );
        Self { values, datasets }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn from_config(&self) -> Option<&str> {
        self.get("from_config").and_then(Value::as_str)
    }

    /// Dataset specs in command line order (or the single built-in default)
    pub fn datasets(&self) -> &[DatasetSpec] {
        &self.datasets
    }

    pub fn methods(&self) -> Vec<String> {
        self.string_list("methods")
    }

    pub fn analysis_methods(&self) -> Vec<String> {
        self.string_list("analysis_methods")
    }

    pub fn clf_algo_for_threshold(&self) -> &str {
        self.get("clf_algo_for_threshold")
            .and_then(Value::as_str)
            .unwrap_or(ClfAlgorithm::default().as_str())
    }

    /// Value of a switch flag (false when unknown)
    pub fn switch(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Build the argument parser. A new parser is created for every parse.
pub fn build_command() -> Command {
    let mut cmd = Command::new("mgt-detect")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Machine-generated text detection experiments")
        .args_override_self(true);

    for def in FLAGS {
        cmd = cmd.arg(build_arg(def));
    }

    cmd.arg(
        Arg::new("dataset")
            .long("dataset")
            .num_args(1..)
            .action(ArgAction::Append)
            .allow_negative_numbers(true)
            .value_names(["FILEPATH", "FILETYPE", "PROCESSOR", "TEXT_FIELD", "LABEL_FIELD", "HUMAN_LABEL", "OTHER"])
            .help(
                "dataset parameters: FILEPATH [FILETYPE PROCESSOR TEXT_FIELD LABEL_FIELD HUMAN_LABEL OTHER]; \
                 only the filepath is required, repeat for several datasets",
            ),
    )
    .arg(
        Arg::new("clf_algo_for_threshold")
            .long("clf_algo_for_threshold")
            .value_parser(PossibleValuesParser::new(ClfAlgorithm::NAMES.iter().copied()))
            .default_value(ClfAlgorithm::default().as_str())
            .help("classification algorithm used for threshold computation"),
    )
}

fn build_arg(def: &FlagDef) -> Arg {
    let mut arg = Arg::new(def.name).long(def.name).help(def.help);
    if let Some(short) = def.short {
        arg = arg.short(short);
    }

    arg = match def.kind {
        FlagKind::Switch => arg.action(ArgAction::SetTrue),
        FlagKind::Text => arg.action(ArgAction::Set),
        FlagKind::Integer => arg
            .action(ArgAction::Set)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64)),
        FlagKind::Float => arg
            .action(ArgAction::Set)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(f64)),
        FlagKind::List { min_values } => arg.action(ArgAction::Set).num_args(min_values..),
    };

    if def.default.is_empty() {
        arg
    } else {
        arg.default_values(def.default.iter().copied())
    }
}

/// Parse the process arguments. Usage errors are returned as `ConfigError::Usage`;
/// the caller decides whether to exit.
pub fn parse_args() -> Result<RawArguments> {
    parse_args_from(std::env::args_os())
}

pub fn parse_args_from<I, T>(args: I) -> Result<RawArguments>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    collect(&matches)
}

fn collect(matches: &ArgMatches) -> Result<RawArguments> {
    let mut values = BTreeMap::new();

    for def in FLAGS {
        let value = match def.kind {
            FlagKind::Switch => Value::Bool(matches.get_flag(def.name)),
            FlagKind::Text => matches
                .get_one::<String>(def.name)
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null),
            FlagKind::Integer => matches
                .get_one::<i64>(def.name)
                .map(|n| Value::from(*n))
                .unwrap_or(Value::Null),
            FlagKind::Float => matches
                .get_one::<f64>(def.name)
                .map(|n| Value::from(*n))
                .unwrap_or(Value::Null),
            FlagKind::List { .. } => Value::Sequence(
                matches
                    .get_many::<String>(def.name)
                    .map(|items| items.map(|s| Value::String(s.clone())).collect())
                    .unwrap_or_default(),
            ),
        };
        values.insert(def.name.to_string(), value);
    }

    let clf = matches
        .get_one::<String>("clf_algo_for_threshold")
        .cloned()
        .unwrap_or_else(|| ClfAlgorithm::default().as_str().to_string());
    values.insert("clf_algo_for_threshold".to_string(), Value::String(clf));

    // The default spec only survives when --dataset was never given
    let mut datasets = vec![DatasetSpec::default()];
    if let Some(occurrences) = matches.get_occurrences::<String>("dataset") {
        for occurrence in occurrences {
            let occurrence: Vec<&String> = occurrence.collect();
            datasets.push(DatasetSpec::from_values(&occurrence)?);
        }
    }
    if datasets.len() != 1 {
        datasets.remove(0);
    }

    Ok(RawArguments::new(values, datasets))
}
