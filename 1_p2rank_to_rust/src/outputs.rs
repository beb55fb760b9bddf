use crate::types::{PredictionArtifacts, ToolError};
use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use glob::glob;

/// Name of the manifest written next to the tool output.
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Scans a `prank predict` output directory for the files the parser needs.
///
/// P2Rank names its outputs after the full input file name (`1abc.pdb_predictions.csv`).
/// When the expected name is missing, the first match of the same suffix is used.
pub fn locate_outputs(output_dir: &Path, input_file_name: &str) -> Result<PredictionArtifacts> {
    let predictions_csv = find_file(
        output_dir.join(format!("{}_predictions.csv", input_file_name)),
        output_dir.join("*_predictions.csv"),
    )?
    .ok_or_else(|| ToolError::MissingOutput(format!("{}_predictions.csv", input_file_name)))?;

    let data_dir = output_dir.join("visualizations").join("data");
    let points_file = find_file(
        data_dir.join(format!("{}_points.pdb.gz", input_file_name)),
        data_dir.join("*_points.pdb*"),
    )?
    .ok_or_else(|| ToolError::MissingOutput(format!("{}_points.pdb.gz", input_file_name)))?;

    let residues_csv = find_file(
        output_dir.join(format!("{}_residues.csv", input_file_name)),
        output_dir.join("*_residues.csv"),
    )?;

    Ok(PredictionArtifacts {
        output_dir: output_dir.to_path_buf(),
        predictions_csv,
        residues_csv,
        points_file,
    })
}

fn find_file(expected: PathBuf, pattern: PathBuf) -> Result<Option<PathBuf>> {
    if expected.exists() {
        return Ok(Some(expected));
    }
    let pattern = pattern.to_string_lossy().into_owned();
    let found = glob(&pattern)
        .with_context(|| format!("Invalid glob pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .next();
    if let Some(path) = &found {
        log::warn!("Expected {:?}, using {:?} instead", expected, path);
    }
    Ok(found)
}

/// Persists the manifest so a later `parse` can skip re-running the tool.
pub fn write_manifest(artifacts: &PredictionArtifacts) -> Result<PathBuf> {
    let path = artifacts.output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(artifacts)?;
    fs::write(&path, json).with_context(|| format!("Could not write {:?}", path))?;
    Ok(path)
}

pub fn read_manifest(output_dir: &Path) -> Result<PredictionArtifacts> {
    let path = output_dir.join(MANIFEST_FILE);
    let json = fs::read_to_string(&path).with_context(|| format!("Could not read {:?}", path))?;
    Ok(serde_json::from_str(&json)?)
}
