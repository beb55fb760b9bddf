//! PyMOL scripts for inspecting predicted pockets.

use crate::core::pocket::PocketCollection;
use crate::io::writer::MARKER_RESIDUE;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Colours cycled through for pocket surfaces.
const SURFACE_COLORS: [&str; 10] = [
    "red", "green", "blue", "yellow", "magenta", "cyan", "orange", "purple", "salmon", "lime",
];

/// Script that loads the combined structure and shows each pocket's markers as coloured spheres.
///
/// `structure_name` is resolved relative to the script, so both files should share a directory.
pub fn pocket_script(structure_name: &str, pockets: &PocketCollection) -> String {
    let mut lines = vec![
        format!("load {}", structure_name),
        format!("hide lines, resn {}", MARKER_RESIDUE),
    ];
    for pocket in pockets {
        let sel = format!("pocket{}", pocket.id);
        lines.push(format!("select {}, resn {} and resi {}", sel, MARKER_RESIDUE, pocket.id));
        // PyMOL colour index; 0 and 1 are white/black
        lines.push(format!("color {}, {}", pocket.id + 1, sel));
        lines.push(format!("show spheres, {}", sel));
        lines.push(format!("set sphere_scale, 0.3, {}", sel));
        lines.push(format!("set sphere_transparency, 0.1, {}", sel));
    }
    lines.push("deselect".to_string());
    to_script(lines)
}

/// Script that paints the protein surface of each pocket's contact residues.
pub fn surface_script(structure_name: &str, pockets: &PocketCollection) -> String {
    let mut lines = vec![
        format!("load {}", structure_name),
        "hide everything".to_string(),
        format!("show surface, not resn {}", MARKER_RESIDUE),
        "color grey80".to_string(),
    ];
    for (i, pocket) in pockets.iter().enumerate() {
        let residues: Vec<String> = pocket
            .contact_residues
            .iter()
            .filter_map(|r| residue_selection(r))
            .collect();
        if residues.is_empty() {
            continue;
        }
        let sel = format!("surf_pocket{}", pocket.id);
        lines.push(format!("select {}, {}", sel, residues.join(" or ")));
        lines.push(format!("color {}, {}", SURFACE_COLORS[i % SURFACE_COLORS.len()], sel));
    }
    lines.push("deselect".to_string());
    to_script(lines)
}

fn to_script(lines: Vec<String>) -> String {
    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// `A_101` becomes `(chain A and resi 101)`. Insertion codes stay attached to the number.
fn residue_selection(id: &str) -> Option<String> {
    let (chain, resi) = id.split_once('_')?;
    if resi.is_empty() {
        return None;
    }
    Some(format!("(chain {} and resi {})", chain, resi))
}

pub fn write_script(script: &str, path: &Path) -> Result<()> {
    fs::write(path, script).with_context(|| format!("Could not write PyMOL script {:?}", path))
}
