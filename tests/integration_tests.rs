use flate2::write::GzEncoder;
use flate2::Compression;
use p2rank_pockets::{
    find_pockets, rebuild_outputs, P2RankConfig, PocketConfig, PocketError, PredictionArtifacts,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str = "name,rank,score,sas_points,surf_atoms,center_x,center_y,center_z,residue_ids,surf_atom_ids";

/// One chain of `n` atoms, ten per residue.
fn protein_pdb(n: usize) -> String {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&format!(
            "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00 10.00           C\n",
            i + 1,
            i / 10 + 1,
            i as f64 * 0.1,
            (i % 7) as f64,
            (i % 11) as f64 * 0.5
        ));
    }
    s.push_str("TER\nEND\n");
    s
}

fn point_line(serial: usize, pocket: u32, i: usize) -> String {
    format!(
        "HETATM{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}\n",
        serial,
        "H",
        "STP",
        "A",
        pocket,
        10.0 + (i % 4) as f64,
        -5.0 + (i / 4) as f64,
        2.5 * (i % 3) as f64,
        0.42,
        0.0
    )
}

/// Points file with unassigned points around two pockets of the given sizes.
fn points_file(sizes: &[(u32, usize)]) -> Vec<u8> {
    let mut text = String::new();
    let mut serial = 1;
    for _ in 0..5 {
        text.push_str(&point_line(serial, 0, serial));
        serial += 1;
    }
    for &(pocket, n) in sizes {
        for i in 0..n {
            text.push_str(&point_line(serial, pocket, i));
            serial += 1;
        }
    }
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(text.as_bytes()).unwrap();
    gz.finish().unwrap()
}

fn predictions_csv() -> String {
    format!(
        "{}\n\
         pocket1,1,0.8,15,6,11.5,-3.0,2.5,A_1 A_2 A_3,1 2 3 4 5 6\n\
         pocket2,2,0.3,2,2,10.5,-5.0,1.25,A_40,391 392\n",
        HEADER
    )
}

/// Lays out a P2Rank output directory the way `prank predict` does.
fn fake_prediction(dir: &Path, input_name: &str) -> PredictionArtifacts {
    let data = dir.join("visualizations").join("data");
    fs::create_dir_all(&data).unwrap();
    let csv_path = dir.join(format!("{}_predictions.csv", input_name));
    fs::write(&csv_path, predictions_csv()).unwrap();
    let points = data.join(format!("{}_points.pdb.gz", input_name));
    fs::write(&points, points_file(&[(1, 15), (2, 2)])).unwrap();
    PredictionArtifacts {
        output_dir: dir.to_path_buf(),
        predictions_csv: csv_path,
        residues_csv: None,
        points_file: points,
    }
}

fn marker_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| l.starts_with("HETATM") && &l[17..20] == "STP")
        .map(str::to_string)
        .collect()
}

#[test]
fn test_rebuild_keeps_only_pockets_with_volume() {
    let dir = tempfile::tempdir().unwrap();
    let pdb = dir.path().join("prot.pdb");
    fs::write(&pdb, protein_pdb(500)).unwrap();
    let artifacts = fake_prediction(dir.path(), "prot.pdb");

    let run = rebuild_outputs(&pdb, &artifacts, dir.path()).expect("rebuild failed");

    assert_eq!(run.pockets.ids(), vec![1]);
    let p1 = run.pockets.get(1).unwrap();
    assert_eq!(p1.score, 0.8);
    assert_eq!(p1.point_count, 15);
    assert!(p1.volume > 0.0);

    let markers = marker_lines(&run.combined_file);
    assert_eq!(markers.len(), 15);
    assert!(markers.iter().all(|l| &l[22..26] == "   1"));

    let combined = fs::read_to_string(&run.combined_file).unwrap();
    assert_eq!(combined.lines().filter(|l| l.starts_with("ATOM")).count(), 500);
    assert!(!combined.contains("TER"));
}

#[test]
fn test_rebuild_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let pdb = dir.path().join("prot.pdb");
    fs::write(&pdb, protein_pdb(50)).unwrap();
    let artifacts = fake_prediction(dir.path(), "prot.pdb");
    let out = dir.path().join("rebuilt");
    fs::create_dir_all(&out).unwrap();

    let run = rebuild_outputs(&pdb, &artifacts, &out).unwrap();

    assert_eq!(run.raw_file, out.join("prot_raw.pdb"));
    assert_eq!(run.combined_file, out.join("prot_out.pdb"));
    assert_eq!(run.pocket_files, vec![out.join("pocketFiles").join("pocket1.pdb")]);
    assert_eq!(marker_lines(&run.pocket_files[0]).len(), 15);

    let pml = fs::read_to_string(&run.pml_file).unwrap();
    assert!(pml.starts_with("load prot_out.pdb"));
    assert!(pml.contains("select pocket1, resn STP and resi 1"));
    assert!(!pml.contains("pocket2"));

    let surf = fs::read_to_string(&run.surface_pml_file).unwrap();
    assert!(surf.contains("(chain A and resi 2)"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&run.json_file).unwrap()).unwrap();
    assert_eq!(json["pockets"].as_array().unwrap().len(), 1);
    assert_eq!(json["pockets"][0]["stats"]["residue_ids"], "A_1-A_2-A_3");
}

#[test]
fn test_pocket_without_summary_row_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let pdb = dir.path().join("prot.pdb");
    fs::write(&pdb, protein_pdb(20)).unwrap();
    let mut artifacts = fake_prediction(dir.path(), "prot.pdb");
    let points = dir.path().join("extra_points.pdb.gz");
    fs::write(&points, points_file(&[(1, 15), (3, 4)])).unwrap();
    artifacts.points_file = points;

    let err = rebuild_outputs(&pdb, &artifacts, dir.path()).unwrap_err();
    assert!(matches!(err.downcast_ref::<PocketError>(), Some(PocketError::MissingSummaryRow(3))));
}

#[test]
fn test_oversized_cif_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut cif = String::from(
        "data_BIG\nloop_\n_atom_site.group_PDB\n_atom_site.id\n_atom_site.type_symbol\n\
         _atom_site.label_atom_id\n_atom_site.label_comp_id\n_atom_site.label_asym_id\n\
         _atom_site.label_seq_id\n_atom_site.Cartn_x\n_atom_site.Cartn_y\n_atom_site.Cartn_z\n",
    );
    for i in 0..70 {
        cif.push_str(&format!("ATOM {} C CA ALA C{} 1 0.0 0.0 {}.0\n", i + 1, i, i));
    }
    let input = dir.path().join("big.cif");
    fs::write(&input, cif).unwrap();

    let config = PocketConfig {
        input,
        output_dir: dir.path().join("run"),
        p2rank: P2RankConfig {
            home: dir.path().join("no-p2rank-here"),
            version: "2.3".into(),
            threads: 1,
            timeout: None,
        },
    };
    let err = find_pockets(&config).unwrap_err();
    match err.downcast_ref::<PocketError>() {
        Some(PocketError::Validation(msgs)) => {
            assert_eq!(msgs.len(), 1);
            assert!(msgs[0].contains("Number of chains (70) > 62"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!dir.path().join("run").exists());
}

/// Installs a stand-in `prank` that copies prepared outputs into `-o`.
#[cfg(unix)]
fn fake_prank(home: &Path, fixtures: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(home).unwrap();
    let script = home.join("prank");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\n\
             [ \"$1\" = predict ] || exit 2\n\
             name=$(basename \"$3\")\n\
             mkdir -p \"$5/visualizations/data\"\n\
             cp {fix}/pred.csv \"$5/${{name}}_predictions.csv\"\n\
             cp {fix}/points.pdb.gz \"$5/visualizations/data/${{name}}_points.pdb.gz\"\n",
            fix = fixtures.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn test_find_pockets_end_to_end_with_stand_in_tool() {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = dir.path().join("fixtures");
    fs::create_dir_all(&fixtures).unwrap();
    fs::write(fixtures.join("pred.csv"), predictions_csv()).unwrap();
    fs::write(fixtures.join("points.pdb.gz"), points_file(&[(1, 15), (2, 2)])).unwrap();
    let home = dir.path().join("p2rank");
    fake_prank(&home, &fixtures);

    let input = dir.path().join("prot.pdb");
    fs::write(&input, protein_pdb(500)).unwrap();
    let config = PocketConfig {
        input,
        output_dir: dir.path().join("run"),
        p2rank: P2RankConfig { home, version: "2.3".into(), threads: 2, timeout: None },
    };

    let (run, report) = find_pockets(&config).expect("pipeline failed");
    assert_eq!(run.pockets.len(), 1);
    assert_eq!(marker_lines(&run.combined_file).len(), 15);
    assert!(report.contains("Pockets kept:    1"));
    assert!(dir.path().join("run").join("run_manifest.json").exists());
}

#[cfg(unix)]
#[test]
fn test_failing_tool_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("p2rank");
    fs::create_dir_all(&home).unwrap();
    let script = home.join("prank");
    fs::write(&script, "#!/bin/sh\necho 'model file missing' >&2\nexit 1\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let input = dir.path().join("prot.pdb");
    fs::write(&input, protein_pdb(10)).unwrap();
    let config = PocketConfig {
        input,
        output_dir: dir.path().join("run"),
        p2rank: P2RankConfig { home, version: "2.3".into(), threads: 1, timeout: None },
    };

    let err = find_pockets(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("model file missing"));
}
