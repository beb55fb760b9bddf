use crate::core::structure::AtomSite;
use anyhow::{anyhow, Context, Result};
use flate2::read::MultiGzDecoder;
use nalgebra::Vector3;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Reads a text file, decompressing it first when the name ends in `.gz`.
pub fn read_text(path: &Path) -> Result<String> {
    let mut contents = String::new();
    if path.extension().map_or(false, |e| e == "gz") {
        let file = File::open(path).with_context(|| format!("Could not open {:?}", path))?;
        MultiGzDecoder::new(file)
            .read_to_string(&mut contents)
            .with_context(|| format!("Could not decompress {:?}", path))?;
    } else {
        contents = fs::read_to_string(path).with_context(|| format!("Could not read {:?}", path))?;
    }
    Ok(contents)
}

/// Splits a CIF data row, honouring single and double quotes.
///
/// A quote only closes a value when followed by whitespace or end of line,
/// so names like `O5'` survive inside double quotes.
fn split_cif_row(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        if chars[i] == '\'' || chars[i] == '"' {
            let quote = chars[i];
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && !(chars[j] == quote && chars.get(j + 1).map_or(true, |c| c.is_whitespace())) {
                j += 1;
            }
            tokens.push(chars[start..j.min(chars.len())].iter().collect());
            i = j + 1;
        } else {
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
        }
    }
    tokens
}

fn is_missing(value: &str) -> bool {
    value == "." || value == "?"
}

/// Parses the first model of an mmCIF `_atom_site` loop.
///
/// Author fields (`auth_*`) are preferred over label fields, as PDB files carry those.
pub fn from_cif(path: &Path) -> Result<Vec<AtomSite>> {
    let contents = read_text(path)?;
    parse_cif_atoms(&contents).with_context(|| format!("Failed to parse mmCIF {:?}", path))
}

pub fn parse_cif_atoms(contents: &str) -> Result<Vec<AtomSite>> {
    let lines: Vec<&str> = contents.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut atoms = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if lines[i] != "loop_" {
            i += 1;
            continue;
        }
        i += 1;

        let mut headers = Vec::new();
        while i < lines.len() && lines[i].starts_with('_') {
            headers.push(lines[i].split_whitespace().next().unwrap_or(lines[i]));
            i += 1;
        }
        if !headers.iter().any(|h| h.starts_with("_atom_site.")) {
            continue;
        }

        let col = |names: &[&str]| -> Option<usize> {
            names.iter().find_map(|n| headers.iter().position(|h| *h == format!("_atom_site.{}", n)))
        };
        let required = |names: &[&str]| -> Result<usize> {
            col(names).ok_or_else(|| anyhow!("mmCIF missing '_atom_site.{}'", names[0]))
        };

        let group_idx = col(&["group_PDB"]);
        let id_idx = col(&["id"]);
        let element_idx = col(&["type_symbol"]);
        let name_idx = required(&["auth_atom_id", "label_atom_id"])?;
        let alt_idx = col(&["label_alt_id"]);
        let res_idx = required(&["auth_comp_id", "label_comp_id"])?;
        let chain_idx = required(&["auth_asym_id", "label_asym_id"])?;
        let seq_idx = col(&["auth_seq_id", "label_seq_id"]);
        let ins_idx = col(&["pdbx_PDB_ins_code"]);
        let x_idx = required(&["Cartn_x"])?;
        let y_idx = required(&["Cartn_y"])?;
        let z_idx = required(&["Cartn_z"])?;
        let occ_idx = col(&["occupancy"]);
        let b_idx = col(&["B_iso_or_equiv"]);
        let model_idx = col(&["pdbx_PDB_model_num"]);

        // Rows may wrap, so tokens are pooled until a full row is available.
        let mut pending: Vec<String> = Vec::new();
        let mut first_model: Option<String> = None;
        while i < lines.len() && !lines[i].starts_with('_') && lines[i] != "loop_" && !lines[i].starts_with('#') && !lines[i].starts_with("data_") {
            pending.extend(split_cif_row(lines[i]));
            i += 1;
            while pending.len() >= headers.len() {
                let row: Vec<String> = pending.drain(..headers.len()).collect();
                let get = |idx: Option<usize>| idx.map(|k| row[k].as_str()).filter(|v| !is_missing(v));

                if let Some(model) = get(model_idx) {
                    let first = first_model.get_or_insert_with(|| model.to_string());
                    if *first != model {
                        continue;
                    }
                }

                let parse_f = |k: usize| -> Result<f64> {
                    row[k].parse::<f64>().with_context(|| format!("Failed to parse '{}' as float", row[k]))
                };

                atoms.push(AtomSite {
                    hetero: get(group_idx) == Some("HETATM"),
                    serial: get(id_idx).and_then(|v| v.parse().ok()).unwrap_or(atoms.len() as u32 + 1),
                    name: row[name_idx].clone(),
                    alt_loc: get(alt_idx).and_then(|v| v.chars().next()).unwrap_or(' '),
                    residue_name: row[res_idx].clone(),
                    chain_id: row[chain_idx].clone(),
                    residue_seq: get(seq_idx).and_then(|v| v.parse().ok()).unwrap_or(0),
                    insertion_code: get(ins_idx).and_then(|v| v.chars().next()).unwrap_or(' '),
                    position: Vector3::new(parse_f(x_idx)?, parse_f(y_idx)?, parse_f(z_idx)?),
                    occupancy: get(occ_idx).and_then(|v| v.parse().ok()).unwrap_or(1.0),
                    b_factor: get(b_idx).and_then(|v| v.parse().ok()).unwrap_or(0.0),
                    element: get(element_idx).unwrap_or("").to_string(),
                });
            }
        }
    }

    if atoms.is_empty() {
        return Err(anyhow!("No atoms found in mmCIF file."));
    }
    Ok(atoms)
}

/// ATOM/HETATM records of a PDB-like text, in file order.
pub fn atom_records(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM"))
        .collect()
}

/// Distinct chain identifiers and atom count of a PDB-like text (PDB, PDBQT).
pub fn count_chains_and_atoms(contents: &str) -> (usize, usize) {
    let records = atom_records(contents);
    let chains: BTreeSet<char> = records.iter().filter_map(|l| l.chars().nth(21)).collect();
    (chains.len(), records.len())
}

/// Same counts for parsed atoms.
pub fn count_atom_sites(atoms: &[AtomSite]) -> (usize, usize) {
    let chains: BTreeSet<&str> = atoms.iter().map(|a| a.chain_id.as_str()).collect();
    (chains.len(), atoms.len())
}
