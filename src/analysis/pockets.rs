use crate::core::pocket::{PocketCollection, PocketRecord, PocketStats, PointRecord, MIN_POCKET_POINTS};
use crate::error::{PocketError, Result};
use crate::io::writer::marker_line;
use crate::math::hull::{pocket_volume, MARKER_RADIUS};
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// Rebuilds one pocket from its points and summary row.
///
/// Returns `None` for pockets with fewer than [`MIN_POCKET_POINTS`] points;
/// their id is not reused.
pub fn build_pocket(id: u32, points: &[PointRecord], stats: &PocketStats) -> Option<PocketRecord> {
    if points.len() < MIN_POCKET_POINTS {
        log::debug!("Dropping pocket {}: {} points", id, points.len());
        return None;
    }

    let coordinates: Vec<Vector3<f64>> = points.iter().map(|p| p.position).collect();
    let marker_lines = points
        .iter()
        .zip(1u32..)
        .map(|(p, serial)| marker_line(serial, id, &p.position, p.occupancy, p.b_factor))
        .collect();
    let center_of_mass = coordinates.iter().sum::<Vector3<f64>>() / coordinates.len() as f64;

    Some(PocketRecord {
        id,
        score: stats.score,
        point_count: points.len(),
        sas_points: stats.sas_points,
        volume: pocket_volume(&coordinates, MARKER_RADIUS),
        center_of_mass,
        contact_atoms: stats.contact_atoms(),
        contact_residues: stats.contact_residues(),
        coordinates,
        marker_lines,
        file: None,
        stats: stats.clone(),
    })
}

/// Builds the collection from grouped points, in ascending pocket id.
///
/// Every group must have a summary row; a missing one fails the whole run.
pub fn build_collection(
    groups: &BTreeMap<u32, Vec<PointRecord>>,
    summary: &BTreeMap<u32, PocketStats>,
) -> Result<PocketCollection> {
    let mut pockets = PocketCollection::new();
    for (&id, points) in groups {
        let stats = summary.get(&id).ok_or(PocketError::MissingSummaryRow(id))?;
        if let Some(pocket) = build_pocket(id, points, stats) {
            pockets.push(pocket);
        }
    }
    let dropped = groups.len() - pockets.len();
    if dropped > 0 {
        log::info!("{} pockets with fewer than {} points left out", dropped, MIN_POCKET_POINTS);
    }
    Ok(pockets)
}
