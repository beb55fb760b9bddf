use crate::error::{PocketError, Result};
use nalgebra::Vector3;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// FORMATS
// ============================================================================

/// On-disk formats accepted as input structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    /// Plain PDB text. Passed to P2Rank untouched.
    Pdb,
    /// mmCIF, optionally gzip-compressed. Converted natively.
    Cif,
    /// AutoDock PDBQT. Converted with Open Babel.
    Pdbqt,
    /// Maestro, optionally compressed. Converted with Schrödinger's exporter.
    Mae,
}

impl StructureFormat {
    /// Detects the format from the file name, looking through a trailing `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let ext = name.rsplit_once('.').map(|(_, e)| e)?;
        match ext {
            "pdb" | "ent" => Some(Self::Pdb),
            "cif" | "mmcif" => Some(Self::Cif),
            "pdbqt" => Some(Self::Pdbqt),
            "mae" | "maegz" => Some(Self::Mae),
            _ => None,
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pdb => "PDB",
            Self::Cif => "mmCIF",
            Self::Pdbqt => "PDBQT",
            Self::Mae => "Maestro",
        };
        f.write_str(s)
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A structure file on disk together with its detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureFile {
    pub path: PathBuf,
    pub format: StructureFormat,
}

impl StructureFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = StructureFormat::from_path(&path)
            .ok_or_else(|| PocketError::UnsupportedFormat(path.clone()))?;
        Ok(Self { path, format })
    }

    /// File name without any extension, e.g. `1abc` for `1abc.cif.gz`.
    pub fn stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.split('.').next().unwrap_or_default().to_string()
    }
}

/// One ATOM/HETATM record, the common currency between the CIF reader and the PDB writer.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    pub hetero: bool,
    pub serial: u32,
    pub name: String,
    pub alt_loc: char,
    pub residue_name: String,
    pub chain_id: String,
    pub residue_seq: i32,
    pub insertion_code: char,
    pub position: Vector3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
    pub element: String,
}
