use crate::tools::ExternalTools;
use crate::types::{P2RankConfig, ToolError, INSTALLED_FLAG};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Downloads and unpacks the configured P2Rank release into `config.home`.
///
/// Mirrors the usual manual steps: fetch the tarball with `wget`, unpack it with
/// `tar --strip-components 1`, drop the tarball and touch the installed flag.
/// Returns `false` when the flag already exists and nothing was done.
pub fn install(config: &P2RankConfig) -> Result<bool> {
    if config.is_installed() {
        log::info!("P2Rank {} already installed at {:?}", config.version, config.home);
        return Ok(false);
    }
    fs::create_dir_all(&config.home)
        .with_context(|| format!("Could not create {:?}", config.home))?;

    let wget = which::which("wget").map_err(|_| ToolError::NotFound("wget".into()))?;
    let tar = which::which("tar").map_err(|_| ToolError::NotFound("tar".into()))?;
    let tarball = format!("p2rank-{}.tar.gz", config.version);

    let runner = ExternalTools::for_helpers(config.clone());
    let home = config.home.as_path();

    log::info!("Downloading {}", config.download_url());
    runner.run_cmd(&wget, [config.download_url().as_str(), "-O", tarball.as_str()], Some(home), None)?;
    runner.run_cmd(&tar, ["-xf", tarball.as_str(), "--strip-components", "1"], Some(home), None)?;
    finish_install(home, &tarball)?;
    Ok(true)
}

/// Removes the unpacked tarball and flags the installation as complete.
fn finish_install(home: &Path, tarball: &str) -> Result<()> {
    let path = home.join(tarball);
    fs::remove_file(&path).with_context(|| format!("Could not remove {:?}", path))?;
    mark_installed(home)
}

fn mark_installed(home: &Path) -> Result<()> {
    fs::write(home.join(INSTALLED_FLAG), "")
        .with_context(|| format!("Could not write install flag in {:?}", home))
}
