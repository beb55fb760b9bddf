use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Minimum number of points a pocket needs before a volume can be computed.
pub const MIN_POCKET_POINTS: usize = 3;

/// One row of the auxiliary points file, typed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub record: String,
    pub serial: String,
    pub atom_name: String,
    pub residue_name: String,
    pub chain_id: String,
    /// 0 means the point was not assigned to any pocket.
    pub pocket: u32,
    pub position: Vector3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
}

/// Summary statistics for one pocket, as reported in `<input>_predictions.csv`.
///
/// Id lists are stored hyphen-joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketStats {
    pub name: String,
    pub rank: u32,
    /// Predictor label, always `P2Rank`.
    pub class: String,
    pub score: f64,
    pub probability: Option<f64>,
    pub sas_points: u32,
    pub surf_atoms: u32,
    pub center: [f64; 3],
    pub residue_ids: String,
    pub surf_atom_ids: String,
}

impl PocketStats {
    pub fn contact_residues(&self) -> BTreeSet<String> {
        self.residue_ids
            .split('-')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Surface atom serials. Anything non-numeric is ignored.
    pub fn contact_atoms(&self) -> BTreeSet<u32> {
        self.surf_atom_ids
            .split('-')
            .filter_map(|s| s.parse().ok())
            .collect()
    }
}

/// A predicted binding pocket rebuilt from the tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PocketRecord {
    /// 1-based, equal to the CSV rank and the pocket index in the points file.
    pub id: u32,
    pub score: f64,
    /// Number of reconstructed points.
    pub point_count: usize,
    /// Point count as reported by the tool.
    pub sas_points: u32,
    /// Cubic ångström.
    pub volume: f64,
    pub center_of_mass: Vector3<f64>,
    pub contact_atoms: BTreeSet<u32>,
    pub contact_residues: BTreeSet<String>,
    pub coordinates: Vec<Vector3<f64>>,
    /// Marker records in PDB layout, newline-terminated.
    #[serde(skip)]
    pub marker_lines: Vec<String>,
    /// Per-pocket PDB file, set once written.
    pub file: Option<PathBuf>,
    pub stats: PocketStats,
}

/// Pockets of one run in ascending id order. Only ever appended to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PocketCollection {
    pockets: Vec<PocketRecord>,
    /// Combined protein + marker file the pockets refer to.
    pub protein_file: Option<PathBuf>,
}

impl PocketCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pocket. Ids must arrive in increasing order.
    pub fn push(&mut self, pocket: PocketRecord) {
        debug_assert!(self.pockets.last().map_or(true, |p| p.id < pocket.id));
        self.pockets.push(pocket);
    }

    pub fn get(&self, id: u32) -> Option<&PocketRecord> {
        self.pockets
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.pockets[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PocketRecord> {
        self.pockets.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PocketRecord> {
        self.pockets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.pockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pockets.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.pockets.iter().map(|p| p.id).collect()
    }
}

impl<'a> IntoIterator for &'a PocketCollection {
    type Item = &'a PocketRecord;
    type IntoIter = std::slice::Iter<'a, PocketRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.pockets.iter()
    }
}
