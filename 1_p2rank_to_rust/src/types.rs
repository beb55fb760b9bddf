use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Release installed by default.
pub const P2RANK_DEFAULT_VERSION: &str = "2.3";

/// Flag file touched once an installation has finished unpacking.
pub const INSTALLED_FLAG: &str = "p2rank_installed";

/// Settings for locating and running P2Rank.
///
/// Built once by the caller and handed to [`crate::ExternalTools::new`];
/// nothing here is read from global state afterwards.
#[derive(Debug, Clone)]
pub struct P2RankConfig {
    /// Directory holding the unpacked release (contains `prank`).
    pub home: PathBuf,
    pub version: String,
    /// Passed straight through as `-threads`.
    pub threads: usize,
    /// Wall-clock limit for one `prank predict` call. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl P2RankConfig {
    /// `P2RANK_HOME` if set, otherwise `./software/em/p2rank-<version>`.
    pub fn from_env() -> Self {
        let version = P2RANK_DEFAULT_VERSION.to_string();
        let home = std::env::var("P2RANK_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home(&version));
        Self {
            home,
            version,
            threads: 1,
            timeout: None,
        }
    }

    pub fn download_url(&self) -> String {
        format!(
            "https://github.com/rdk/p2rank/releases/download/{v}/p2rank_{v}.tar.gz",
            v = self.version
        )
    }

    pub fn is_installed(&self) -> bool {
        self.home.join(INSTALLED_FLAG).exists()
    }
}

fn default_home(version: &str) -> PathBuf {
    Path::new("software").join("em").join(format!("p2rank-{}", version))
}

/// File manifest of one `prank predict` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionArtifacts {
    pub output_dir: PathBuf,
    /// `<input>_predictions.csv`, one row per pocket.
    pub predictions_csv: PathBuf,
    /// `<input>_residues.csv`, not produced by every release.
    pub residues_csv: Option<PathBuf>,
    /// `visualizations/data/<input>_points.pdb.gz`.
    pub points_file: PathBuf,
}

/// Failures of an external program, kept typed so callers can tell them apart
/// from I/O problems after they travel through `anyhow`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("'{0}' not found. Install it or put it in PATH.")]
    NotFound(String),
    #[error("Command failed: {program:?} ({status})\nStderr: {stderr}")]
    Failed {
        program: PathBuf,
        status: String,
        stderr: String,
    },
    #[error("Command timed out: {0:?}")]
    TimedOut(PathBuf),
    #[error("P2Rank output missing: {0}")]
    MissingOutput(String),
}
