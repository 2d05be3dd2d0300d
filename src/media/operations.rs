//! Picture downloads and attachment-graph queries.
//!
//! These are the network-facing building blocks; [`MediaResolver`](super::MediaResolver)
//! decides which of them to run for each entry.

use super::backend::{HttpBackend, MediaError};
use super::cache::{cache_filename, cached_path};
use crate::config::GraphConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of one [`download`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// The file was already on disk; no request was made.
    Cached(String),
    Fetched(String),
    /// The server answered with a non-success status; nothing was written.
    Skipped { status: u16 },
}

impl Download {
    /// Local filename, unless the download was skipped.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Download::Cached(name) | Download::Fetched(name) => Some(name),
            Download::Skipped { .. } => None,
        }
    }
}

/// Download `url` into `dir` under its content-addressed name.
///
/// The body is streamed to `<name>.part` and renamed once complete, so a
/// failed transfer never leaves a file that would later count as cached.
pub fn download(backend: &dyn HttpBackend, url: &str, dir: &Path) -> Result<Download, MediaError> {
    fs::create_dir_all(dir)?;
    let filename = cache_filename(url);
    let path = cached_path(dir, url);

    if path.exists() {
        debug!(url, %filename, "picture already cached");
        return Ok(Download::Cached(filename));
    }

    let mut response = backend.get(url, &[])?;
    if !response.is_success() {
        warn!(url, status = response.status, "picture not available, leaving it out");
        return Ok(Download::Skipped {
            status: response.status,
        });
    }

    let partial = dir.join(format!("{filename}.part"));
    let written = fs::File::create(&partial)
        .and_then(|mut file| io::copy(&mut response.body, &mut file));
    let bytes = match written {
        Ok(bytes) => bytes,
        Err(error) => {
            let _ = fs::remove_file(&partial);
            return Err(error.into());
        }
    };
    if let Err(error) = fs::rename(&partial, &path) {
        let _ = fs::remove_file(&partial);
        return Err(error.into());
    }

    debug!(url, %filename, bytes, "picture downloaded");
    Ok(Download::Fetched(filename))
}

// ============================================================================
// Attachment graph
// ============================================================================

/// One page of the attachments endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AttachmentPage {
    #[serde(default)]
    pub data: Vec<Attachment>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// A node of the attachment graph: a `photo` leaf, an `album` of further
/// nodes, or some other type this archive does not download.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub subattachments: Option<Subattachments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub image: Option<ImageSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSource {
    pub src: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subattachments {
    #[serde(default)]
    pub data: Vec<Attachment>,
}

/// Query the attachments of one entry.
///
/// Reads the first page only unless `graph.follow_paging` is set. A
/// non-success status on any page is [`MediaError::GraphStatus`], so the
/// fetch error policy decides whether it stops the run.
pub fn fetch_attachments(
    backend: &dyn HttpBackend,
    graph: &GraphConfig,
    entry_id: &str,
    token: &str,
) -> Result<Vec<Attachment>, MediaError> {
    let mut attachments = Vec::new();
    let mut seen = HashSet::new();
    let mut response = backend.get(&graph.attachments_url(entry_id), &[("access_token", token)])?;

    loop {
        if !response.is_success() {
            return Err(MediaError::GraphStatus {
                entry: entry_id.to_string(),
                status: response.status,
            });
        }
        let page: AttachmentPage =
            serde_json::from_reader(&mut response.body).map_err(|source| MediaError::Graph {
                entry: entry_id.to_string(),
                source,
            })?;
        attachments.extend(page.data);

        let next = page.paging.and_then(|paging| paging.next);
        match next {
            Some(url) if graph.follow_paging && seen.insert(url.clone()) => {
                debug!(entry = entry_id, "following attachment paging");
                response = backend.get(&url, &[])?;
            }
            Some(_) if !graph.follow_paging => {
                debug!(entry = entry_id, "more attachment pages available, not followed");
                break;
            }
            _ => break,
        }
    }
    Ok(attachments)
}

/// Image URLs of every `photo` leaf, in document order, with `album` nodes
/// expanded in place.
///
/// Uses an explicit stack, so arbitrarily deep album nesting cannot exhaust
/// the call stack.
pub fn photo_sources(attachments: &[Attachment]) -> Vec<&str> {
    let mut sources = Vec::new();
    let mut stack: Vec<&Attachment> = attachments.iter().rev().collect();

    while let Some(node) = stack.pop() {
        match node.kind.as_str() {
            "photo" => match node.media.as_ref().and_then(|m| m.image.as_ref()) {
                Some(image) => sources.push(image.src.as_str()),
                None => debug!("photo attachment without an image source"),
            },
            "album" => {
                if let Some(children) = &node.subattachments {
                    stack.extend(children.data.iter().rev());
                }
            }
            other => debug!(kind = other, "ignoring attachment"),
        }
    }
    sources
}
