use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use std::env;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use anyhow::{anyhow, Result, Context};
use wait_timeout::ChildExt;

use crate::types::{P2RankConfig, ToolError};

/// Manages external binaries the pocket workflow calls out to.
pub struct ExternalTools {
    pub config: P2RankConfig,
    pub prank_bin: PathBuf,
}

impl ExternalTools {
    /// Locates `prank` in the configured home, falling back to the system PATH.
    ///
    /// The helper converters (`obabel`, `structconvert`, `pymol`) are only needed
    /// for some inputs, so they are resolved on demand instead.
    pub fn new(config: P2RankConfig) -> Result<Self> {
        let local = config.home.join(prank_name());
        let prank_bin = if local.exists() {
            local
        } else {
            which::which("prank").map_err(|_| ToolError::NotFound(format!(
                "prank (looked in {:?})", config.home
            )))?
        };
        log::debug!("Using prank at {:?}", prank_bin);
        Ok(Self { config, prank_bin })
    }

    /// Tools for jobs that never call `prank` (installing it, opening viewers).
    pub fn for_helpers(config: P2RankConfig) -> Self {
        let prank_bin = config.home.join(prank_name());
        Self { config, prank_bin }
    }

    /// Open Babel, used to turn PDBQT into PDB.
    pub fn obabel(&self) -> Result<PathBuf> {
        which::which("obabel").or_else(|_| {
            // Fallback for Docker/Linux standard paths
            let p = Path::new("/usr/bin/obabel");
            if p.exists() { Ok(p.to_path_buf()) }
            else { Err(ToolError::NotFound("obabel".into()).into()) }
        })
    }

    /// Schrödinger's exporter for Maestro files.
    pub fn structconvert(&self) -> Result<PathBuf> {
        if let Ok(root) = env::var("SCHRODINGER") {
            let p = Path::new(&root).join("utilities").join("structconvert");
            if p.exists() {
                return Ok(p);
            }
        }
        which::which("structconvert")
            .map_err(|_| ToolError::NotFound("structconvert (set SCHRODINGER)".into()).into())
    }

    pub fn pymol(&self) -> Result<PathBuf> {
        which::which("pymol").map_err(|_| ToolError::NotFound("pymol".into()).into())
    }

    /// Executes a command with an optional timeout, returning trimmed stdout.
    ///
    /// A non-zero exit is reported with the program's stderr verbatim.
    pub fn run_cmd<I, S>(&self, program: &Path, args: I, cwd: Option<&Path>, timeout: Option<Duration>) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().with_context(|| format!("Failed to spawn {:?}", program))?;

        // Pipes are drained while waiting, or a chatty child blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match timeout {
            Some(duration) => match child.wait_timeout(duration)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::TimedOut(program.to_path_buf()).into());
                }
            },
            None => child.wait()?,
        };
        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;

        if !status.success() {
            return Err(ToolError::Failed {
                program: program.to_path_buf(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            }.into());
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

type Drain = Option<JoinHandle<io::Result<Vec<u8>>>>;

/// Reads a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            p.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<Vec<u8>> {
    match handle {
        Some(h) => {
            let bytes = h.join().map_err(|_| anyhow!("Output reader thread panicked"))??;
            Ok(bytes)
        }
        None => Ok(Vec::new()),
    }
}

fn prank_name() -> &'static str {
    if cfg!(windows) { "prank.bat" } else { "prank" }
}
