// main.rs - CLI entry point

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use mgt_detect::cli::ConfigSource;
use mgt_detect::methods::ANALYSIS_METHODS;
use mgt_detect::output::RESULTS_DIR;
use mgt_detect::prelude::*;

/// Directory searched by --list_datasets
const DATASETS_DIR: &str = "datasets";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        // Prints usage to stderr (help/version to stdout) and exits with clap's code
        Err(ConfigError::Usage(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    println!("🚀 mgt-detect v{}", env!("CARGO_PKG_VERSION"));
    let source = ConfigSource::of(&args);
    match (source, args.from_config()) {
        (ConfigSource::FromFile, Some(path)) => println!("📄 Configuration: {} (other flags ignored)", path),
        _ => println!("📄 Configuration: command line"),
    }

    let config = ConfigLoader::new()
        .load(&args)
        .context("failed to build the run configuration")?;

    if config.switch("list_methods") {
        print_methods();
        return Ok(());
    }
    if config.switch("list_analysis_methods") {
        print_analysis_methods();
        return Ok(());
    }
    if config.switch("list_datasets") {
        return print_datasets();
    }

    let report = validate_config(&config)?;

    println!("📊 Datasets: {}", report.datasets.len());
    for dataset in config.datasets() {
        println!(
            "  • {} (filetype: {}, processor: {}, human label: {})",
            dataset.filepath, dataset.filetype, dataset.processor, dataset.human_label
        );
    }
    println!("🔬 Methods: {}", report.methods.join(", "));
    if report.analysis.is_empty() {
        println!("📈 Analysis: none");
    } else {
        println!("📈 Analysis: {}", report.analysis.join(", "));
    }
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }

    let saved = save_resolved_config(Path::new(RESULTS_DIR), &config).map_err(|e| anyhow!(e))?;
    println!("💾 Resolved configuration saved to: {}", saved.display());
    println!("✅ Configuration ready");
    Ok(())
}

fn print_methods() {
    let registry = MethodRegistry::new();
    println!("Available methods:");
    for (name, description) in registry.list_methods() {
        let family = registry
            .get_method(name)
            .map(|m| m.family.to_string())
            .unwrap_or_default();
        println!("  - {} [{}]: {}", name, family, description);
    }
}

fn print_analysis_methods() {
    println!("Available analysis methods:");
    for (name, description) in ANALYSIS_METHODS {
        println!("  - {}: {}", name, description);
    }
}

fn print_datasets() -> anyhow::Result<()> {
    let dir = Path::new(DATASETS_DIR);
    if !dir.is_dir() {
        println!("No '{}' directory found", DATASETS_DIR);
        return Ok(());
    }

    let mut files: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("failed to read '{}'", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.path().display().to_string())
        .collect();
    files.sort();

    println!("Available datasets:");
    for file in files {
        println!("  - {}", file);
    }
    Ok(())
}
