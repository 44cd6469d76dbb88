// mod.rs - Writing experiment results and the configuration that produced them

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Utc;
use log::info;
use regex::Regex;
use serde::Serialize;

use crate::cli::ResolvedConfig;
use crate::methods::ExperimentResult;

/// Default directory for result logs
pub const RESULTS_DIR: &str = "results";

#[derive(Serialize)]
struct ResultsLog<'a> {
    generated: String,
    version: &'static str,
    config: &'a ResolvedConfig,
    results: &'a [ExperimentResult],
}

/// Characters not allowed in a results file name
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("file name regex"));

/// File stem for a run: the sanitized `--name`, or a UTC timestamp
pub fn results_file_stem(name: Option<&str>) -> String {
    let sanitized = name.map(|n| UNSAFE_FILE_CHARS.replace_all(n.trim(), "_").into_owned());

    match sanitized {
        Some(stem) if !stem.is_empty() && stem.chars().any(|c| c != '_' && c != '.') => stem,
        _ => Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
    }
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

/// Write results and the resolved configuration as pretty JSON to `<dir>/<name>.json`
pub fn save_results(
    dir: &Path,
    config: &ResolvedConfig,
    results: &[ExperimentResult],
) -> Result<PathBuf, String> {
    let path = dir.join(format!("{}.json", results_file_stem(config.name())));
    ensure_parent_dir(&path)?;

    let file = File::create(&path)
        .map_err(|e| format!("Failed to create results file '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    let log = ResultsLog {
        generated: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        version: env!("CARGO_PKG_VERSION"),
        config,
        results,
    };
    serde_json::to_writer_pretty(&mut writer, &log)
        .map_err(|e| format!("Failed to serialize results: {}", e))?;
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

/// Write the resolved configuration next to the results, for reproducing the run
pub fn save_resolved_config(dir: &Path, config: &ResolvedConfig) -> Result<PathBuf, String> {
    let path = dir.join(format!("{}.config.yaml", results_file_stem(config.name())));
    config.to_file(&path).map_err(|e| e.to_string())?;
    Ok(path)
}
