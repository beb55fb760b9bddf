use crate::core::pocket::PocketCollection;
use crate::core::structure::AtomSite;
use anyhow::{Context, Result};
use nalgebra::Vector3;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Atom name of pocket marker records.
pub const MARKER_ATOM: &str = "APOL";
/// Residue name of pocket marker records; viewers select pockets with `resn STP`.
pub const MARKER_RESIDUE: &str = "STP";
pub const MARKER_CHAIN: char = 'C';
pub const MARKER_ELEMENT: &str = "Ve";

/// Directory, under the run directory, that receives one PDB per pocket.
pub const POCKET_DIR: &str = "pocketFiles";

/// Formats one PDB ATOM/HETATM record up to the element column, newline-terminated.
#[allow(clippy::too_many_arguments)]
fn pdb_record(
    hetero: bool,
    serial: u32,
    name: &str,
    alt_loc: char,
    residue: &str,
    chain: char,
    seq: i32,
    insertion: char,
    pos: &Vector3<f64>,
    occupancy: f64,
    b_factor: f64,
    element: &str,
) -> String {
    format!(
        "{:<6}{:>5} {:<4}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}\n",
        if hetero { "HETATM" } else { "ATOM" },
        serial,
        name,
        alt_loc,
        residue,
        chain,
        seq,
        insertion,
        pos.x,
        pos.y,
        pos.z,
        occupancy,
        b_factor,
        element
    )
}

/// PDB record for a parsed atom. One-letter elements keep their names in column 14.
pub fn format_atom_site(atom: &AtomSite) -> String {
    let name = if atom.name.len() < 4 && atom.element.len() <= 1 {
        format!(" {}", atom.name)
    } else {
        atom.name.clone()
    };
    pdb_record(
        atom.hetero,
        atom.serial,
        &name,
        atom.alt_loc,
        &atom.residue_name,
        atom.chain_id.chars().next().unwrap_or(' '),
        atom.residue_seq,
        atom.insertion_code,
        &atom.position,
        atom.occupancy,
        atom.b_factor,
        &atom.element,
    )
}

/// Marker record for one pocket point.
pub fn marker_line(serial: u32, pocket: u32, pos: &Vector3<f64>, occupancy: f64, b_factor: f64) -> String {
    pdb_record(
        true,
        serial,
        MARKER_ATOM,
        ' ',
        MARKER_RESIDUE,
        MARKER_CHAIN,
        pocket as i32,
        ' ',
        pos,
        occupancy,
        b_factor,
        MARKER_ELEMENT,
    )
}

/// Writes parsed atoms as a PDB file.
pub fn to_pdb(atoms: &[AtomSite], path: &Path) -> Result<()> {
    let mut out = String::with_capacity(atoms.len() * 81);
    for atom in atoms {
        out.push_str(&format_atom_site(atom));
    }
    out.push_str("END\n");
    fs::write(path, out).with_context(|| format!("Could not write PDB {:?}", path))
}

/// Writes the protein's ATOM/HETATM records only (no TER, no END).
pub fn write_raw_pdb(records: &[&str], output: &Path) -> Result<()> {
    let mut out = String::new();
    for r in records {
        writeln!(out, "{}", r)?;
    }
    fs::write(output, out).with_context(|| format!("Could not write {:?}", output))
}

/// Protein records followed by the marker records of every pocket, in id order.
pub fn write_combined(records: &[&str], pockets: &PocketCollection, output: &Path) -> Result<()> {
    let mut out = String::new();
    for r in records {
        writeln!(out, "{}", r)?;
    }
    for pocket in pockets {
        for line in &pocket.marker_lines {
            out.push_str(line);
        }
    }
    fs::write(output, out).with_context(|| format!("Could not write {:?}", output))
}

/// Writes `pocketFiles/pocket<N>.pdb` for every pocket and records the paths.
pub fn write_pocket_files(pockets: &mut PocketCollection, run_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = run_dir.join(POCKET_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Could not create {:?}", dir))?;
    let mut files = Vec::with_capacity(pockets.len());
    for pocket in pockets.iter_mut() {
        let path = dir.join(format!("pocket{}.pdb", pocket.id));
        fs::write(&path, pocket.marker_lines.concat())
            .with_context(|| format!("Could not write {:?}", path))?;
        pocket.file = Some(path.clone());
        files.push(path);
    }
    Ok(files)
}

pub fn write_collection_json(pockets: &PocketCollection, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(pockets)?;
    fs::write(path, json).with_context(|| format!("Could not write {:?}", path))
}
