// experiment.rs - Metric-based experiment: criterion scores + threshold classifier

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{ClfAlgorithm, MethodEntry};
use crate::error::ConfigError;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("method '{method}' is missing parameter '{param}'")]
    MissingParameter { method: String, param: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create cache directory '{}': {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{partition} partition has {texts} texts but {labels} labels")]
    LengthMismatch {
        partition: &'static str,
        texts: usize,
        labels: usize,
    },

    #[error("criterion failed: {0}")]
    Criterion(String),

    #[error("classifier failed: {0}")]
    Classifier(String),
}

/// Texts and labels of one partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub text: Vec<String>,
    pub label: Vec<u32>,
}

impl Partition {
    fn check(&self, partition: &'static str) -> Result<(), ExperimentError> {
        if self.text.len() != self.label.len() {
            return Err(ExperimentError::LengthMismatch {
                partition,
                texts: self.text.len(),
                labels: self.label.len(),
            });
        }
        Ok(())
    }
}

/// Loaded dataset split into train and test partitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentData {
    pub train: Partition,
    pub test: Partition,
}

/// Settings a metric-based method reads from its resolved entry
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSettings {
    pub cache_dir: PathBuf,
    pub base_model_name: String,
    pub device: String,
    pub clf_algorithm: ClfAlgorithm,
}

impl MetricSettings {
    pub fn from_method(method: &MethodEntry) -> Result<Self, ExperimentError> {
        let required = |param: &str| {
            method
                .str_param(param)
                .map(str::to_string)
                .ok_or_else(|| ExperimentError::MissingParameter {
                    method: method.name.clone(),
                    param: param.to_string(),
                })
        };

        Ok(Self {
            cache_dir: PathBuf::from(required("cache_dir")?),
            base_model_name: required("base_model_name")?,
            device: required("DEVICE")?,
            clf_algorithm: method.clf_algorithm()?,
        })
    }
}

/// Fall back to the CPU when a CUDA device is requested but unavailable
pub fn resolve_device(requested: &str, cuda_available: bool) -> String {
    if requested.contains("cuda") && !cuda_available {
        warn!("Setting device to cpu. Cuda is not available.");
        "cpu".to_string()
    } else {
        requested.to_string()
    }
}

/// Turns a text into a numeric score vector using the base model.
///
/// Implementations own the model; `prepare` is called once before scoring.
pub trait Criterion {
    fn prepare(&mut self, _settings: &MetricSettings) -> Result<(), ExperimentError> {
        Ok(())
    }

    fn score(&mut self, text: &str) -> Result<Vec<f64>, ExperimentError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub acc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionOutput {
    pub predictions: Vec<u32>,
    /// Probability of the machine class for every text
    pub machine_prob: Vec<f64>,
    pub metrics: ClassificationMetrics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierOutput {
    pub train: PartitionOutput,
    pub test: PartitionOutput,
}

/// Fits a classifier on train scores and evaluates it on both partitions
pub trait ThresholdClassifier {
    fn fit_evaluate(
        &mut self,
        algorithm: ClfAlgorithm,
        x_train: &[Vec<f64>],
        y_train: &[u32],
        x_test: &[Vec<f64>],
        y_test: &[u32],
    ) -> Result<ClassifierOutput, ExperimentError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTest<T> {
    pub train: T,
    pub test: T,
}

/// Everything a finished experiment reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub input_data: ExperimentData,
    pub predictions: TrainTest<Vec<u32>>,
    pub machine_prob: TrainTest<Vec<f64>>,
    pub criterion: TrainTest<Vec<Vec<f64>>>,
    pub running_time_seconds: f64,
    pub metrics_results: TrainTest<ClassificationMetrics>,
    pub config: MethodEntry,
}

pub struct MetricBasedExperiment<C, K> {
    name: String,
    data: ExperimentData,
    method: MethodEntry,
    settings: MetricSettings,
    criterion: C,
    classifier: K,
}

impl<C: Criterion, K: ThresholdClassifier> MetricBasedExperiment<C, K> {
    pub fn new(
        data: ExperimentData,
        method: &MethodEntry,
        criterion: C,
        classifier: K,
    ) -> Result<Self, ExperimentError> {
        data.train.check("train")?;
        data.test.check("test")?;

        Ok(Self {
            name: method.name.clone(),
            settings: MetricSettings::from_method(method)?,
            method: method.clone(),
            data,
            criterion,
            classifier,
        })
    }

    pub fn settings(&self) -> &MetricSettings {
        &self.settings
    }

    pub fn run(mut self, cuda_available: bool) -> Result<ExperimentResult, ExperimentError> {
        let start = Instant::now();

        if !self.settings.cache_dir.exists() {
            fs::create_dir_all(&self.settings.cache_dir).map_err(|source| ExperimentError::CacheDir {
                path: self.settings.cache_dir.clone(),
                source,
            })?;
        }
        info!("Using cache dir {}", self.settings.cache_dir.display());

        self.settings.device = resolve_device(&self.settings.device, cuda_available);
        info!("Loading BASE model {} on {}", self.settings.base_model_name, self.settings.device);
        self.criterion.prepare(&self.settings)?;

        let train_criterion = score_partition(
            &mut self.criterion,
            &self.data.train.text,
            "Computing metrics on train partition",
        )?;
        let test_criterion = score_partition(
            &mut self.criterion,
            &self.data.test.text,
            "Computing metrics on test partition",
        )?;

        let output = self.classifier.fit_evaluate(
            self.settings.clf_algorithm,
            &train_criterion,
            &self.data.train.label,
            &test_criterion,
            &self.data.test.label,
        )?;

        for (partition, metrics) in [("train", &output.train.metrics), ("test", &output.test.metrics)] {
            info!(
                "{} acc_{partition}: {}, precision_{partition}: {}, recall_{partition}: {}, f1_{partition}: {}",
                self.name, metrics.acc, metrics.precision, metrics.recall, metrics.f1
            );
        }

        Ok(ExperimentResult {
            name: format!("{}_threshold", self.name),
            kind: "metric-based".to_string(),
            input_data: self.data,
            predictions: TrainTest {
                train: output.train.predictions,
                test: output.test.predictions,
            },
            machine_prob: TrainTest {
                train: output.train.machine_prob,
                test: output.test.machine_prob,
            },
            criterion: TrainTest {
                train: train_criterion,
                test: test_criterion,
            },
            running_time_seconds: start.elapsed().as_secs_f64(),
            metrics_results: TrainTest {
                train: output.train.metrics,
                test: output.test.metrics,
            },
            config: self.method,
        })
    }
}

fn score_partition<C: Criterion>(
    criterion: &mut C,
    texts: &[String],
    message: &'static str,
) -> Result<Vec<Vec<f64>>, ExperimentError> {
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(message);

    let mut scores = Vec::with_capacity(texts.len());
    for text in texts {
        scores.push(criterion.score(text)?);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(scores)
}
