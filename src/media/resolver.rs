//! Per-entry media resolution.
//!
//! Walks the entries once, downloads what they reference and rewrites every
//! picture reference to a path inside the output directory. After
//! [`MediaResolver::resolve_all`] returns, no remote URL is left in any
//! `picture` field: each one is either `pictures/<hash>` or `None`.

use super::backend::{HttpBackend, MediaError};
use super::cache::DownloadStats;
use super::operations::{self, Download};
use crate::config::{ArchiveConfig, FetchErrorPolicy, GraphConfig, MediaStrategy};
use crate::model::Entry;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Subdirectory of the output directory holding downloaded pictures.
pub const PICTURES_DIR: &str = "pictures";

pub struct MediaResolver<'a> {
    backend: &'a dyn HttpBackend,
    pictures_dir: PathBuf,
    strategy: MediaStrategy,
    on_error: FetchErrorPolicy,
    graph: GraphConfig,
    token: Option<String>,
    stats: DownloadStats,
}

impl<'a> MediaResolver<'a> {
    /// Fails with [`MediaError::MissingToken`] when the attachments strategy
    /// is selected without a token, before any request is made.
    pub fn new(
        backend: &'a dyn HttpBackend,
        output_dir: &Path,
        config: &ArchiveConfig,
        token: Option<&str>,
    ) -> Result<Self, MediaError> {
        let token = token.filter(|t| !t.is_empty()).map(str::to_string);
        if config.media_strategy == MediaStrategy::Attachments && token.is_none() {
            return Err(MediaError::MissingToken);
        }
        Ok(Self {
            backend,
            pictures_dir: output_dir.join(PICTURES_DIR),
            strategy: config.media_strategy,
            on_error: config.on_fetch_error,
            graph: config.graph.clone(),
            token,
            stats: DownloadStats::default(),
        })
    }

    pub fn resolve_all(&mut self, entries: &mut [Entry]) -> Result<(), MediaError> {
        for entry in entries.iter_mut() {
            self.resolve_entry(entry)?;
        }
        info!(strategy = ?self.strategy, summary = %self.stats, "media resolved");
        Ok(())
    }

    pub fn resolve_entry(&mut self, entry: &mut Entry) -> Result<(), MediaError> {
        if self.strategy == MediaStrategy::Attachments {
            entry.pictures = self.attachment_pictures(&entry.id)?;
        }

        entry.picture = match entry.picture.take() {
            Some(_) if !entry.pictures.is_empty() => None,
            Some(url) => self.localize(&url)?,
            None => None,
        };

        for comment in &mut entry.comments {
            if let Some(url) = comment.picture.take() {
                comment.picture = self.localize(&url)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> &DownloadStats {
        &self.stats
    }

    pub fn into_stats(self) -> DownloadStats {
        self.stats
    }

    /// Download `url` and return its path relative to the output directory.
    fn localize(&mut self, url: &str) -> Result<Option<String>, MediaError> {
        Ok(self
            .fetch(url)?
            .map(|filename| format!("{PICTURES_DIR}/{filename}")))
    }

    /// Download `url` and return the bare filename, or `None` when the
    /// picture is unavailable.
    fn fetch(&mut self, url: &str) -> Result<Option<String>, MediaError> {
        let result = operations::download(self.backend, url, &self.pictures_dir);
        match self.absorb(result)? {
            Some(Download::Cached(name)) => {
                self.stats.hit();
                Ok(Some(name))
            }
            Some(Download::Fetched(name)) => {
                self.stats.fetch();
                Ok(Some(name))
            }
            Some(Download::Skipped { .. }) => {
                self.stats.skip();
                Ok(None)
            }
            None => {
                self.stats.fail();
                Ok(None)
            }
        }
    }

    fn attachment_pictures(&mut self, entry_id: &str) -> Result<Vec<String>, MediaError> {
        let Some(token) = self.token.as_deref() else {
            return Err(MediaError::MissingToken);
        };
        let result = operations::fetch_attachments(self.backend, &self.graph, entry_id, token);
        let Some(attachments) = self.absorb(result)? else {
            self.stats.query_fail();
            return Ok(Vec::new());
        };

        let sources = operations::photo_sources(&attachments);
        debug!(entry = entry_id, photos = sources.len(), "attachments listed");
        let mut pictures = Vec::with_capacity(sources.len());
        for src in sources {
            if let Some(filename) = self.fetch(src)? {
                pictures.push(filename);
            }
        }
        Ok(pictures)
    }

    /// Apply the fetch error policy: pass errors through under `abort`, log
    /// them and return `None` under `skip`.
    fn absorb<T>(&self, result: Result<T, MediaError>) -> Result<Option<T>, MediaError> {
        match (result, self.on_error) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(error), FetchErrorPolicy::Skip) => {
                warn!(%error, "media fetch failed, continuing");
                Ok(None)
            }
            (Err(error), FetchErrorPolicy::Abort) => Err(error),
        }
    }
}
