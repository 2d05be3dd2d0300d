//! Content-addressed picture cache.
//!
//! A downloaded picture is stored under the SHA-256 of its **source URL**,
//! not of its bytes. The name can therefore be computed before any request is
//! made, and a file with that name already on disk is a cache hit: the
//! network is not touched at all. Entries never expire and are never evicted;
//! deleting `pictures/` is the only way to force a re-download.
//!
//! The same URL always maps to the same file, so one picture referenced by
//! several posts is downloaded once and shared.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Local file name for a picture URL: lowercase hex SHA-256 of the URL bytes.
pub fn cache_filename(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Full path of the cached file for `url` inside `dir`.
pub fn cached_path(dir: &Path, url: &str) -> PathBuf {
    dir.join(cache_filename(url))
}

/// Summary of picture downloads for one archive run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadStats {
    /// Already on disk, no request made.
    pub cached: u32,
    pub fetched: u32,
    /// Server answered with a non-success status.
    pub skipped: u32,
    /// Transport or IO failure tolerated by the `skip` error policy.
    pub failed: u32,
    /// Attachment queries that failed under the `skip` error policy. Not
    /// pictures, so not part of [`total`](Self::total).
    pub queries_failed: u32,
}

impl DownloadStats {
    pub fn hit(&mut self) {
        self.cached += 1;
    }

    pub fn fetch(&mut self) {
        self.fetched += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn query_fail(&mut self) {
        self.queries_failed += 1;
    }

    /// Pictures seen, whatever happened to them.
    pub fn total(&self) -> u32 {
        self.cached + self.fetched + self.skipped + self.failed
    }
}

impl fmt::Display for DownloadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queries = match self.queries_failed {
            0 => String::new(),
            1 => "; 1 attachment query failed".to_string(),
            n => format!("; {n} attachment queries failed"),
        };
        if self.total() == 0 {
            return write!(f, "no pictures{queries}");
        }
        let mut parts = Vec::new();
        if self.cached > 0 {
            parts.push(format!("{} cached", self.cached));
        }
        if self.fetched > 0 {
            parts.push(format!("{} downloaded", self.fetched));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if parts.len() == 1 {
            write!(f, "{}{queries}", parts[0])
        } else {
            write!(f, "{} ({} total){queries}", parts.join(", "), self.total())
        }
    }
}
