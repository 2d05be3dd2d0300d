//! Theme asset copying.
//!
//! Mirrors the theme's static directories into the output directory. The copy
//! is additive: files are created or overwritten, never deleted, so anything
//! else already in the output (pictures, a previous `index.html`) survives.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot walk theme directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Theme subdirectories mirrored into every archive.
pub const THEME_ASSET_DIRS: [&str; 2] = ["fonts", "assets"];

/// What one or more copies wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u32,
    pub directories: u32,
}

impl std::ops::AddAssign for CopyStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.directories += other.directories;
    }
}

/// Copy `fonts/` and `assets/` from `theme_dir` into `output_dir`.
pub fn copy_theme_assets(theme_dir: &Path, output_dir: &Path) -> Result<CopyStats, AssetError> {
    let mut stats = CopyStats::default();
    for name in THEME_ASSET_DIRS {
        stats += copy_tree(&theme_dir.join(name), &output_dir.join(name))?;
    }
    info!(
        files = stats.files,
        theme = %theme_dir.display(),
        "theme assets copied"
    );
    Ok(stats)
}

/// Copy a file or a directory tree from `source` to `destination`.
///
/// A missing `source` copies nothing. Existing destination files are
/// overwritten and modification times are carried over.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<CopyStats, AssetError> {
    let mut stats = CopyStats::default();

    if !source.exists() {
        debug!(source = %source.display(), "nothing to copy");
        return Ok(stats);
    }
    if source.is_file() {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_file(source, destination)?;
        stats.files += 1;
        return Ok(stats);
    }
    if destination.exists() && !destination.is_dir() {
        return Err(AssetError::NotADirectory(destination.to_path_buf()));
    }

    for item in WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
    {
        let item = item?;
        let relative = item
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| item.path());
        let target = destination.join(relative);

        if item.file_type().is_dir() {
            if target.exists() && !target.is_dir() {
                return Err(AssetError::NotADirectory(target));
            }
            if !target.exists() {
                fs::create_dir_all(&target)?;
                stats.directories += 1;
            }
        } else {
            copy_file(item.path(), &target)?;
            stats.files += 1;
        }
    }
    Ok(stats)
}

fn copy_file(source: &Path, destination: &Path) -> Result<(), AssetError> {
    fs::copy(source, destination)?;
    preserve_mtime(source, destination);
    Ok(())
}

/// Best effort: a filesystem that refuses to set times still gets the copy.
fn preserve_mtime(source: &Path, destination: &Path) {
    let result = fs::metadata(source)
        .and_then(|meta| meta.modified())
        .and_then(|mtime| {
            fs::OpenOptions::new()
                .write(true)
                .open(destination)?
                .set_modified(mtime)
        });
    if let Err(error) = result {
        debug!(path = %destination.display(), %error, "could not preserve mtime");
    }
}
