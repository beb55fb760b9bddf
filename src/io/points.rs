//! Reader for the P2Rank points file (`visualizations/data/<input>_points.pdb.gz`).
//!
//! Every candidate surface point is written as a HETATM record whose residue
//! sequence number carries the pocket index (0 = no pocket). The records follow
//! the PDB column layout, but the writer lets wide values run into their
//! neighbours: a five-digit serial fuses with the record name, large negative
//! coordinates fuse with each other. Whitespace splitting is tried first and the
//! fixed PDB offsets are the fallback.

use crate::core::pocket::PointRecord;
use crate::error::{PocketError, Result};
use flate2::read::MultiGzDecoder;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of columns in a point record.
pub const POINT_COLUMNS: usize = 11;

/// Trimmed length of a well-formed record.
pub const NOMINAL_WIDTH: usize = 66;

/// Column dropped from over-long records before slicing. It is the leading
/// character of the serial slot, which an over-wide serial pushes everything past.
pub const OVERFLOW_OFFSET: usize = 6;

/// Byte ranges of the 11 columns in a nominal record.
const COLUMN_RANGES: [(usize, usize); POINT_COLUMNS] = [
    (0, 6),   // record name
    (6, 11),  // serial
    (12, 16), // atom name
    (17, 20), // residue name
    (21, 22), // chain
    (22, 26), // pocket index
    (30, 38), // x
    (38, 46), // y
    (46, 54), // z
    (54, 60), // occupancy
    (60, 66), // temperature factor
];

/// Splits one record into its 11 column values.
///
/// `line_no` is only used for error reporting.
pub fn split_point_line(line: &str, line_no: usize) -> Result<Vec<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() == POINT_COLUMNS {
        return Ok(tokens.into_iter().map(str::to_string).collect());
    }
    split_fixed_width(line).ok_or_else(|| malformed(line, line_no))
}

/// Fixed-offset split, with the single overflow column removed from records
/// whose trimmed length is not [`NOMINAL_WIDTH`].
pub fn split_fixed_width(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim_end();
    if !trimmed.is_ascii() {
        return None;
    }
    let mut record = trimmed.to_string();
    if record.len() != NOMINAL_WIDTH && record.len() > OVERFLOW_OFFSET {
        record.remove(OVERFLOW_OFFSET);
    }
    if record.len() < NOMINAL_WIDTH {
        return None;
    }
    Some(
        COLUMN_RANGES
            .iter()
            .map(|&(start, end)| record[start..end].trim().to_string())
            .collect(),
    )
}

/// Splits and types one record.
pub fn parse_point_line(line: &str, line_no: usize) -> Result<PointRecord> {
    let cols = split_point_line(line, line_no)?;
    let num = |i: usize| -> Result<f64> {
        cols[i].parse::<f64>().map_err(|_| malformed(line, line_no))
    };
    let pocket = cols[5].parse::<u32>().map_err(|_| malformed(line, line_no))?;

    Ok(PointRecord {
        record: cols[0].clone(),
        serial: cols[1].clone(),
        atom_name: cols[2].clone(),
        residue_name: cols[3].clone(),
        chain_id: cols[4].clone(),
        pocket,
        position: Vector3::new(num(6)?, num(7)?, num(8)?),
        occupancy: num(9)?,
        b_factor: num(10)?,
    })
}

/// Groups every assigned point by pocket index, keeping file order within a pocket.
///
/// Unassigned points (index 0) are dropped. Records other than ATOM/HETATM are skipped,
/// but a malformed point record aborts the whole read.
pub fn group_points<R: BufRead>(reader: R) -> Result<BTreeMap<u32, Vec<PointRecord>>> {
    let mut groups: BTreeMap<u32, Vec<PointRecord>> = BTreeMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if !(line.starts_with("HETATM") || line.starts_with("ATOM")) {
            continue;
        }
        let point = parse_point_line(&line, i + 1)?;
        if point.pocket == 0 {
            continue;
        }
        groups.entry(point.pocket).or_default().push(point);
    }
    log::debug!("Grouped points into {} pockets", groups.len());
    Ok(groups)
}

/// Opens a points file, transparently decompressing `.gz`.
pub fn read_points_file(path: &Path) -> Result<BTreeMap<u32, Vec<PointRecord>>> {
    let file = File::open(path)?;
    let gzipped = path.extension().map_or(false, |e| e == "gz");
    if gzipped {
        group_points(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        group_points(BufReader::new(file))
    }
}

fn malformed(line: &str, line_no: usize) -> PocketError {
    PocketError::MalformedPointLine { line_no, line: line.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_line(serial: u32, pocket: u32, xyz: [f64; 3]) -> String {
        format!(
            "HETATM{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
            serial, "H", "STP", "A", pocket, xyz[0], xyz[1], xyz[2], 0.35, 1.0
        )
    }

    #[test]
    fn nominal_record_has_nominal_width() {
        assert_eq!(point_line(1, 1, [1.0, 2.0, 3.0]).len(), NOMINAL_WIDTH);
    }

    #[test]
    fn whitespace_and_fixed_offsets_agree_on_regular_records() {
        for serial in [1, 42, 999, 9999] {
            for pocket in [0, 1, 7, 99] {
                let line = point_line(serial, pocket, [12.5, -3.25, 101.0]);
                let by_space = split_point_line(&line, 1).unwrap();
                let by_offset = split_fixed_width(&line).unwrap();
                assert_eq!(by_space, by_offset, "line {:?}", line);
            }
        }
    }

    #[test]
    fn five_digit_serial_falls_back_to_offsets() {
        let line = point_line(10001, 3, [-4.5, 22.125, 7.0]);
        assert_ne!(line.split_whitespace().count(), POINT_COLUMNS);

        let p = parse_point_line(&line, 1).unwrap();
        assert_eq!(p.serial, "10001");
        assert_eq!(p.pocket, 3);
        assert_eq!(p.position, Vector3::new(-4.5, 22.125, 7.0));
        assert_eq!(p.occupancy, 0.35);
    }

    #[test]
    fn fused_negative_coordinates_fall_back_to_offsets() {
        let line = point_line(12, 5, [-100.125, -200.5, -300.75]);
        assert!(line.contains("-100.125-200.500"));
        let p = parse_point_line(&line, 1).unwrap();
        assert_eq!(p.pocket, 5);
        assert_eq!(p.position, Vector3::new(-100.125, -200.5, -300.75));
    }

    #[test]
    fn overflowing_serial_column_is_removed() {
        let line = point_line(123456, 2, [1.0, -2.0, 3.5]);
        assert_eq!(line.len(), NOMINAL_WIDTH + 1);
        let cols = split_fixed_width(&line).unwrap();
        assert_eq!(cols[0], "HETATM");
        assert_eq!(cols[5], "2");
        assert_eq!(cols[6..9], ["1.000", "-2.000", "3.500"]);
    }

    #[test]
    fn wide_pocket_indices_are_read_from_their_slot() {
        let xyz = [-100.125, 2.5, -3.0];
        for (serial, pocket) in [(12, 150), (12, 1000), (123456, 150), (123456, 1234), (10001, 9999)] {
            let line = point_line(serial, pocket, xyz);
            let p = parse_point_line(&line, 1).unwrap();
            assert_eq!(p.pocket, pocket, "line {:?}", line);
            assert_eq!(p.position, Vector3::from(xyz), "line {:?}", line);
        }
    }

    #[test]
    fn pocket_index_fused_with_chain_uses_offsets() {
        let line = point_line(12, 1000, [1.0, 2.0, 3.0]);
        assert!(line.contains("A1000"));
        assert_eq!(line.len(), NOMINAL_WIDTH);
        let cols = split_point_line(&line, 1).unwrap();
        assert_eq!(cols[4], "A");
        assert_eq!(cols[5], "1000");
    }

    #[test]
    fn two_overflowing_columns_are_fatal() {
        let line = point_line(123456, 12345, [-100.125, 2.5, -3.0]);
        assert_eq!(line.len(), NOMINAL_WIDTH + 2);
        match parse_point_line(&line, 4) {
            Err(PocketError::MalformedPointLine { line_no, .. }) => assert_eq!(line_no, 4),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_record_is_fatal() {
        let line = "HETATM10001  H   STP A   1      1.000";
        let err = parse_point_line(line, 7).unwrap_err();
        match err {
            PocketError::MalformedPointLine { line_no, .. } => assert_eq!(line_no, 7),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn groups_skip_unassigned_and_keep_order() {
        let mut text = String::new();
        let layout = [(0, 2), (1, 3), (2, 1), (3, 4), (1, 0), (0, 5)];
        let mut serial = 1;
        for &(pocket, n) in &layout {
            for _ in 0..n {
                text.push_str(&point_line(serial, pocket, [serial as f64, 0.0, 0.0]));
                text.push('\n');
                serial += 1;
            }
        }
        text.push_str("END\n");

        let groups = group_points(text.as_bytes()).unwrap();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(groups[&1].len(), 3);
        assert_eq!(groups[&2].len(), 1);
        assert_eq!(groups[&3].len(), 4);
        let serials: Vec<&str> = groups[&3].iter().map(|p| p.serial.as_str()).collect();
        assert_eq!(serials, ["7", "8", "9", "10"]);
    }

    #[test]
    fn bad_line_aborts_grouping() {
        let text = format!("{}\nHETATM garbage\n", point_line(1, 1, [0.0; 3]));
        assert!(group_points(text.as_bytes()).is_err());
    }
}
