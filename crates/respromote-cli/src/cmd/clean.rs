//! Clean command (staging directory)

use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::style::Stylize;
use respromote_core::{PromoteConfig, Staging};

/// Remove staged archives
///
/// The config file is only read when no `--stage-dir` is given; endpoints
/// are never resolved.
pub async fn clean(config_path: &Path, stage_dir: Option<PathBuf>, quiet: bool) -> Result<()> {
    let dir = match stage_dir {
        Some(dir) => dir,
        None => PromoteConfig::load(config_path).await?.promotion.stage_dir,
    };
    let staging = Staging::new(dir);

    if !quiet {
        eprintln!("  Cleaning {}...", staging.dir().display());
    }
    let removed = staging.purge().await?;

    println!("{} {removed} file(s) removed", "✓".green());
    Ok(())
}
