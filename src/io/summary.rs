use crate::core::pocket::PocketStats;
use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Label stored as the pocket class.
pub const POCKET_CLASS: &str = "P2Rank";

/// Raw row of `<input>_predictions.csv`. P2Rank pads every cell with spaces.
#[derive(Debug, Deserialize)]
struct PredictionRow {
    name: String,
    rank: u32,
    score: f64,
    #[serde(default)]
    probability: Option<f64>,
    sas_points: u32,
    surf_atoms: u32,
    center_x: f64,
    center_y: f64,
    center_z: f64,
    residue_ids: String,
    surf_atom_ids: String,
}

impl From<PredictionRow> for PocketStats {
    fn from(row: PredictionRow) -> Self {
        Self {
            name: row.name,
            rank: row.rank,
            class: POCKET_CLASS.to_string(),
            score: row.score,
            probability: row.probability,
            sas_points: row.sas_points,
            surf_atoms: row.surf_atoms,
            center: [row.center_x, row.center_y, row.center_z],
            residue_ids: hyphen_join(&row.residue_ids),
            surf_atom_ids: hyphen_join(&row.surf_atom_ids),
        }
    }
}

fn hyphen_join(ids: &str) -> String {
    ids.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Reads the prediction summary, keyed by pocket rank.
pub fn read_summary<R: Read>(reader: R) -> Result<BTreeMap<u32, PocketStats>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = BTreeMap::new();
    for row in rdr.deserialize::<PredictionRow>() {
        let stats = PocketStats::from(row?);
        rows.insert(stats.rank, stats);
    }
    Ok(rows)
}

pub fn read_summary_file(path: &Path) -> Result<BTreeMap<u32, PocketStats>> {
    let rows = read_summary(std::fs::File::open(path)?)?;
    log::info!("Read {} pocket summaries from {:?}", rows.len(), path);
    Ok(rows)
}
