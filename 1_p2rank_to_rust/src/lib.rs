//! Thin wrapper around the P2Rank command line.
//!
//! Runs `prank predict` for one structure and reports where its outputs landed.
//! Parsing those outputs is the caller's business.

pub mod tools;
pub mod types;
pub mod outputs;
pub mod install;

pub use crate::tools::ExternalTools;
pub use crate::types::{P2RankConfig, PredictionArtifacts, ToolError};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Runs `prank predict -f <pdb> -o <output_dir> -threads <N>` and locates its outputs.
///
/// Both paths are made absolute because the process runs with `output_dir` as cwd.
pub fn predict(tools: &ExternalTools, pdb_path: &Path, output_dir: &Path) -> Result<PredictionArtifacts> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create output directory {:?}", output_dir))?;
    let abs_pdb = fs::canonicalize(pdb_path)
        .with_context(|| format!("Input structure not found: {:?}", pdb_path))?;
    let abs_out = fs::canonicalize(output_dir)?;

    let args = prediction_args(&abs_pdb, &abs_out, tools.config.threads);
    log::info!("Running P2Rank on {:?} ({} threads)", abs_pdb, tools.config.threads);
    let stdout = tools.run_cmd(&tools.prank_bin, &args, Some(&abs_out), tools.config.timeout)?;
    log::debug!("prank output:\n{}", stdout);

    let input_name = abs_pdb
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Input structure has no file name")?;
    let artifacts = outputs::locate_outputs(&abs_out, &input_name)?;
    outputs::write_manifest(&artifacts)?;
    Ok(artifacts)
}

/// Command-line arguments for one prediction.
pub fn prediction_args(pdb_path: &Path, output_dir: &Path, threads: usize) -> Vec<String> {
    vec![
        "predict".to_string(),
        "-f".to_string(),
        pdb_path.to_string_lossy().into_owned(),
        "-o".to_string(),
        output_dir.to_string_lossy().into_owned(),
        "-threads".to_string(),
        threads.to_string(),
    ]
}
