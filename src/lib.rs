//! # group-archive
//!
//! Turns an exported social-group feed (a JSON array of posts with comments,
//! likes and pictures) into a self-contained static archive: one `index.html`,
//! the pictures it references, and the theme's fonts and stylesheets.
//!
//! # Pipeline
//!
//! ```text
//! data.json ──► model ──► sort ──► media ──► render ──► assets
//!              (build)  (by date) (download) (index.html) (fonts/, assets/)
//! ```
//!
//! Every stage runs once, synchronously, and any hard failure aborts the run.
//! The one deliberate soft failure is a non-success HTTP status on a picture
//! download: the picture is left out and the run carries on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Builds `Entry`/`Comment`/`Author` from raw JSON and sorts entries chronologically |
//! | [`sanitize`] | Escapes message bodies and turns bare URLs into links |
//! | [`media`] | Content-addressed picture downloads, direct and attachment-graph strategies |
//! | [`render`] | Renders the archive page with Maud |
//! | [`assets`] | Mirrors the theme's `fonts/` and `assets/` into the output |
//! | [`archive`] | Orchestrates one run |
//! | [`config`] | `config.toml` loading, validation and color CSS generation |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## Content-addressed picture cache
//!
//! A picture's local name is the SHA-256 of its source URL. A file with that
//! name already in `pictures/` is reused without touching the network, so
//! re-running an archive into the same output directory only downloads what is
//! new. Files are streamed to a `.part` name first and renamed on completion,
//! which keeps an interrupted run from leaving a truncated file behind that a
//! later run would mistake for a cache hit.
//!
//! ## Maud for the page
//!
//! The page template is compiled into the binary with
//! [Maud](https://maud.lambda.xyz/). Interpolated text is escaped, so raw
//! message bodies are safe to render; sanitized bodies are emitted as the
//! already-escaped HTML the [`sanitize`] module produced.
//!
//! ## HTTP behind a trait
//!
//! Downloads go through [`media::HttpBackend`]. The production backend is a
//! blocking `reqwest` client; tests substitute a recording mock so the whole
//! media pipeline is exercised without a network.

pub mod archive;
pub mod assets;
pub mod config;
pub mod media;
pub mod model;
pub mod output;
pub mod render;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod test_helpers;
