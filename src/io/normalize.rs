use crate::core::structure::{StructureFile, StructureFormat};
use crate::error::PocketError;
use crate::io::{parser, writer};
use anyhow::{Context, Result};
use p2rank_rust::ExternalTools;
use std::fs;
use std::path::{Path, PathBuf};

/// Chains a PDB file can label with one character (A-Z, a-z, 0-9).
pub const MAX_CHAINS: usize = 62;
/// Largest serial the five PDB serial columns can hold.
pub const MAX_ATOMS: usize = 99_999;

/// Messages for structures too large to be written as PDB.
pub fn check_limits(name: &str, chains: usize, atoms: usize) -> Vec<String> {
    let mut errors = Vec::new();
    if chains > MAX_CHAINS {
        errors.push(format!(
            "The atom structure file {} is too big for converting to pdb, which is needed for running P2Rank. \
             Number of chains ({}) > {}",
            name, chains, MAX_CHAINS
        ));
    }
    if atoms > MAX_ATOMS {
        errors.push(format!(
            "The atom structure file {} is too big for converting to pdb, which is needed for running P2Rank. \
             Number of atoms ({}) > {}",
            name, atoms, MAX_ATOMS
        ));
    }
    errors
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Checks an input before anything runs. An empty list means it is usable.
///
/// PDB inputs are taken as they are. Maestro files can only be counted once
/// exported, so [`normalize_structure`] checks them after conversion.
pub fn validate_structure(path: &Path) -> Vec<String> {
    if !path.exists() {
        return vec![format!("Input structure {:?} does not exist", path)];
    }
    let input = match StructureFile::new(path) {
        Ok(input) => input,
        Err(e) => return vec![e.to_string()],
    };
    let name = file_name(path);
    match input.format {
        StructureFormat::Pdb | StructureFormat::Mae => Vec::new(),
        StructureFormat::Cif => match parser::from_cif(path) {
            Ok(atoms) => {
                let (chains, n) = parser::count_atom_sites(&atoms);
                check_limits(&name, chains, n)
            }
            Err(e) => vec![format!("{:#}", e)],
        },
        StructureFormat::Pdbqt => match parser::read_text(path) {
            Ok(text) => {
                let (chains, n) = parser::count_chains_and_atoms(&text);
                check_limits(&name, chains, n)
            }
            Err(e) => vec![format!("{:#}", e)],
        },
    }
}

/// Produces a PDB file P2Rank can read, converting into `work_dir` when needed.
pub fn normalize_structure(input: &StructureFile, work_dir: &Path, tools: &ExternalTools) -> Result<PathBuf> {
    let out = work_dir.join(format!("{}.pdb", input.stem()));
    match input.format {
        StructureFormat::Pdb => return Ok(input.path.clone()),
        StructureFormat::Cif => {
            let atoms = parser::from_cif(&input.path)?;
            writer::to_pdb(&atoms, &out)?;
        }
        StructureFormat::Pdbqt => {
            let obabel = tools.obabel()?;
            let in_path = input.path.to_string_lossy().into_owned();
            let out_path = out.to_string_lossy().into_owned();
            tools.run_cmd(&obabel, ["-ipdbqt", in_path.as_str(), "-opdb", "-O", out_path.as_str()], None, None)?;
        }
        StructureFormat::Mae => {
            let structconvert = tools.structconvert()?;
            tools.run_cmd(&structconvert, [input.path.as_os_str(), out.as_os_str()], None, None)?;
            let text = fs::read_to_string(&out)
                .with_context(|| format!("structconvert produced no PDB at {:?}", out))?;
            let (chains, atoms) = parser::count_chains_and_atoms(&text);
            let errors = check_limits(&file_name(&input.path), chains, atoms);
            if !errors.is_empty() {
                return Err(PocketError::Validation(errors).into());
            }
        }
    }
    log::info!("Converted {} input {:?} to {:?}", input.format, input.path, out);
    Ok(out)
}
