use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use p2rank_pockets::{
    find_pockets, rebuild_outputs, run_report, ExternalTools, P2RankConfig, PocketConfig, StructureFile,
};
use p2rank_rust::{install, outputs};

#[derive(Parser)]
#[command(author, version, about = "P2Rank ligand-binding pocket prediction")]
struct Cli {
    /// P2Rank installation directory (defaults to $P2RANK_HOME).
    #[arg(long, global = true)]
    p2rank_home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predicts pockets on a structure and writes pocket files and viewer scripts.
    Predict {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Threads handed to P2Rank's random forest.
        #[arg(long, default_value_t = 1)]
        threads: usize,

        /// Give up on P2Rank after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Rebuilds pockets from an existing P2Rank output directory.
    Parse {
        /// The PDB file P2Rank was run on.
        #[arg(short, long)]
        pdb: PathBuf,

        /// Directory passed to `prank predict -o`.
        #[arg(short = 'd', long)]
        prediction_dir: PathBuf,

        /// Where to write the rebuilt outputs (defaults to the prediction directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Downloads and unpacks P2Rank.
    Install,
    /// Opens a generated PyMOL script.
    View {
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    let mut p2rank = P2RankConfig::from_env();
    if let Some(home) = cli.p2rank_home {
        p2rank.home = home;
    }

    match cli.command {
        Commands::Predict { input, output, threads, timeout } => {
            println!("--- P2Rank Pocket Finder ---");

            // Hard validation
            if threads == 0 {
                anyhow::bail!("--threads must be at least 1.");
            }
            p2rank.threads = threads;
            p2rank.timeout = timeout.map(Duration::from_secs);

            let config = PocketConfig { input, output_dir: output, p2rank };
            let (run, report) = find_pockets(&config)?;

            println!("\nSuccess!");
            println!("{}", report);
            println!("Wrote {} pocket files.", run.pocket_files.len());
        }
        Commands::Parse { pdb, prediction_dir, output } => {
            let artifacts = outputs::read_manifest(&prediction_dir).or_else(|_| {
                let name = pdb
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("PDB path has no file name")?;
                outputs::locate_outputs(&prediction_dir, &name)
            })?;
            let run_dir = output.unwrap_or(prediction_dir);
            std::fs::create_dir_all(&run_dir)?;

            let run = rebuild_outputs(&pdb, &artifacts, &run_dir)?;
            println!("{}", run_report(&StructureFile::new(&pdb)?, &run));
        }
        Commands::Install => {
            if install::install(&p2rank)? {
                println!("P2Rank {} installed in {:?}", p2rank.version, p2rank.home);
            } else {
                println!("P2Rank {} already present in {:?}", p2rank.version, p2rank.home);
            }
        }
        Commands::View { script } => {
            let tools = ExternalTools::for_helpers(p2rank);
            let pymol = tools.pymol()?;
            let dir = script
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = script.file_name().context("Script path has no file name")?;
            tools.run_cmd(&pymol, [name], Some(&dir), None)?;
        }
    }

    log::debug!("Done in {:.2?}", start_time.elapsed());
    Ok(())
}
