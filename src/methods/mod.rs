// mod.rs - Detection methods: registry and experiment orchestration

pub mod experiment;
pub mod registry;

// Re-export main types for convenience
pub use experiment::{
    resolve_device, ClassificationMetrics, ClassifierOutput, Criterion, ExperimentData, ExperimentError,
    ExperimentResult, MetricBasedExperiment, MetricSettings, Partition, PartitionOutput, ThresholdClassifier,
    TrainTest,
};
pub use registry::{has_analysis_method, MethodFamily, MethodInfo, MethodRegistry, ALL_METHODS, ANALYSIS_METHODS};
