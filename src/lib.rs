// ============================================================================
// MODULE DECLARATIONS
// ============================================================================
pub mod core;
pub mod error;
pub mod io;
pub mod math;
pub mod analysis;

// ============================================================================
// RE-EXPORTS (Public API)
// ============================================================================
pub use crate::core::structure::{AtomSite, StructureFile, StructureFormat};
pub use crate::core::pocket::{PocketCollection, PocketRecord, PocketStats, PointRecord};
pub use crate::error::PocketError;
pub use crate::io::{normalize, parser, pml, points, summary, writer};
pub use crate::analysis::pockets::{build_collection, build_pocket};

pub use p2rank_rust::{ExternalTools, P2RankConfig, PredictionArtifacts};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// HIGH-LEVEL INTERFACE
// ============================================================================

/// Configuration for one pocket prediction run.
#[derive(Debug, Clone)]
pub struct PocketConfig {
    /// Structure to analyse (PDB, mmCIF, PDBQT or Maestro).
    pub input: PathBuf,
    /// Run directory. Must not be shared with another run.
    pub output_dir: PathBuf,
    pub p2rank: P2RankConfig,
}

/// Files and pockets produced by one run.
#[derive(Debug, Clone)]
pub struct PocketRun {
    pub pockets: PocketCollection,
    /// Protein records followed by every pocket's markers.
    pub combined_file: PathBuf,
    pub raw_file: PathBuf,
    pub pocket_files: Vec<PathBuf>,
    pub pml_file: PathBuf,
    pub surface_pml_file: PathBuf,
    pub json_file: PathBuf,
}

/// The master pipeline: validate, convert, run P2Rank, rebuild the pockets.
pub fn find_pockets(config: &PocketConfig) -> Result<(PocketRun, String)> {
    // 0. VALIDATION
    let errors = normalize::validate_structure(&config.input);
    if !errors.is_empty() {
        return Err(PocketError::Validation(errors).into());
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Could not create run directory {:?}", config.output_dir))?;

    // 1. CONVERSION
    let tools = ExternalTools::new(config.p2rank.clone())?;
    let input = StructureFile::new(&config.input)?;
    let pdb_path = normalize::normalize_structure(&input, &config.output_dir, &tools)?;

    // 2. PREDICTION
    let artifacts = p2rank_rust::predict(&tools, &pdb_path, &config.output_dir)
        .context("P2Rank prediction failed")?;

    // 3. RECONSTRUCTION
    let run = rebuild_outputs(&pdb_path, &artifacts, &config.output_dir)?;
    let report = run_report(&input, &run);
    Ok((run, report))
}

/// Rebuilds pockets and writes every output file from an existing P2Rank result.
pub fn rebuild_outputs(pdb_path: &Path, artifacts: &PredictionArtifacts, run_dir: &Path) -> Result<PocketRun> {
    let name = StructureFile::new(pdb_path)
        .map(|s| s.stem())
        .unwrap_or_else(|_| pdb_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default());

    let summary = summary::read_summary_file(&artifacts.predictions_csv)
        .with_context(|| format!("Failed to read {:?}", artifacts.predictions_csv))?;
    let groups = points::read_points_file(&artifacts.points_file)
        .with_context(|| format!("Failed to read {:?}", artifacts.points_file))?;
    let mut pockets = build_collection(&groups, &summary)?;

    let protein = parser::read_text(pdb_path)?;
    let records = parser::atom_records(&protein);

    let raw_file = run_dir.join(format!("{}_raw.pdb", name));
    writer::write_raw_pdb(&records, &raw_file)?;

    let combined_file = run_dir.join(format!("{}_out.pdb", name));
    writer::write_combined(&records, &pockets, &combined_file)?;
    pockets.protein_file = Some(combined_file.clone());

    let pocket_files = writer::write_pocket_files(&mut pockets, run_dir)?;

    let combined_name = format!("{}_out.pdb", name);
    let pml_file = run_dir.join(format!("{}.pml", name));
    pml::write_script(&pml::pocket_script(&combined_name, &pockets), &pml_file)?;
    let surface_pml_file = run_dir.join(format!("{}_surf.pml", name));
    pml::write_script(&pml::surface_script(&combined_name, &pockets), &surface_pml_file)?;

    let json_file = run_dir.join("pockets.json");
    writer::write_collection_json(&pockets, &json_file)?;

    log::info!("Rebuilt {} pockets into {:?}", pockets.len(), run_dir);
    Ok(PocketRun {
        pockets,
        combined_file,
        raw_file,
        pocket_files,
        pml_file,
        surface_pml_file,
        json_file,
    })
}

/// Human-readable summary of a run.
pub fn run_report(input: &StructureFile, run: &PocketRun) -> String {
    let mut out = format!(
        "--- Pocket Prediction Report ---\n\
         • Input:           {:?} ({})\n\
         • Pockets kept:    {}\n\
         • Combined file:   {:?}\n\
         • PyMOL script:    {:?}",
        input.path,
        input.format,
        run.pockets.len(),
        run.combined_file,
        run.pml_file,
    );
    for p in &run.pockets {
        out.push_str(&format!(
            "\n  pocket {:>3}  score {:>7.2}  points {:>4}  volume {:>9.2} Å³",
            p.id, p.score, p.point_count, p.volume
        ));
    }
    out
}
