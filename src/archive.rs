//! One archive run, start to finish.
//!
//! ```text
//! load JSON ─► build entries ─► sort ─► resolve media ─► render index.html
//!                                                       ─► copy theme assets
//!                                                       ─► write entries.json (optional)
//! ```
//!
//! Stages run in order on the calling thread. The first hard failure stops
//! the run: nothing already written is rolled back and nothing is retried.

use crate::assets::{self, AssetError, CopyStats};
use crate::config::{ArchiveConfig, ContentPolicy};
use crate::media::{DownloadStats, HttpBackend, MediaError, MediaResolver};
use crate::model::{self, Entry, ModelError};
use crate::render::{self, RenderError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Name of the optional normalized-entries manifest.
pub const MANIFEST_FILE: &str = "entries.json";

/// Inputs of one run that do not come from `config.toml`.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    /// Feed export to read.
    pub data: PathBuf,
    pub output: PathBuf,
    /// Access token for the attachment graph.
    pub token: Option<String>,
}

/// What a run produced.
#[derive(Debug)]
pub struct ArchiveReport {
    /// Resolved entries, oldest first.
    pub entries: Vec<Entry>,
    pub downloads: DownloadStats,
    pub assets: CopyStats,
    pub index_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

/// Read, build and sort the entries of a feed file.
pub fn load_entries(path: &Path, policy: ContentPolicy) -> Result<Vec<Entry>, ArchiveError> {
    let json = fs::read_to_string(path).map_err(|source| ArchiveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = model::parse_entries(&json, policy)?;
    info!(entries = entries.len(), path = %path.display(), "feed loaded");
    Ok(entries)
}

/// Run the whole pipeline for `job`.
pub fn run(
    job: &ArchiveJob,
    config: &ArchiveConfig,
    backend: &dyn HttpBackend,
) -> Result<ArchiveReport, ArchiveError> {
    // Check the token before reading anything
    let mut resolver = MediaResolver::new(backend, &job.output, config, job.token.as_deref())?;

    let mut entries = load_entries(&job.data, config.content_policy)?;
    resolver.resolve_all(&mut entries)?;
    let downloads = resolver.into_stats();

    let index_path = render::render_page(&entries, &job.output, config)?;
    let assets = assets::copy_theme_assets(&config.theme_path(), &job.output)?;

    let manifest_path = if config.write_manifest {
        Some(write_manifest(&entries, &job.output)?)
    } else {
        None
    };

    Ok(ArchiveReport {
        entries,
        downloads,
        assets,
        index_path,
        manifest_path,
    })
}

/// Write the resolved entries as pretty JSON to `output_dir/entries.json`.
pub fn write_manifest(entries: &[Entry], output_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let path = output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(&path, json)?;
    info!(path = %path.display(), "manifest written");
    Ok(path)
}
