//! Local file handling for finished downloads.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context};
use tracing::{debug, info};

/// Move a downloaded file into `archive_dir`, keeping its name.
///
/// Falls back to copy + remove when the archive lives on another
/// filesystem. Returns the new path.
pub fn archive(path: &Path, archive_dir: &Path) -> anyhow::Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    std::fs::create_dir_all(archive_dir)
        .with_context(|| format!("cant create {}", archive_dir.display()))?;
    let target = archive_dir.join(name);
    if target.exists() {
        bail!("{} already exists", target.display());
    }

    if std::fs::rename(path, &target).is_err() {
        debug!("rename failed, copying {} instead", path.display());
        std::fs::copy(path, &target)
            .with_context(|| format!("cant copy {} to {}", path.display(), target.display()))?;
        std::fs::remove_file(path)
            .with_context(|| format!("cant remove {}", path.display()))?;
    }
    info!("archived {} to {}", path.display(), target.display());
    Ok(target)
}

/// Hand a file to the system opener (`xdg-open`, `termux-open`, ...).
/// Does not wait for the opener to exit.
pub fn open(command: &str, path: &Path) -> anyhow::Result<()> {
    if command.trim().is_empty() {
        bail!("no open command configured");
    }
    tokio::process::Command::new(command)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("cant run {command}"))?;
    info!("opened {} with {}", path.display(), command);
    Ok(())
}
