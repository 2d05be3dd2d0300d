//! Picture downloads: blocking HTTP, content-addressed on disk.
//!
//! | Concern | Where |
//! |---|---|
//! | **Transport** | [`HttpBackend`] trait + [`ReqwestBackend`] |
//! | **Naming** | SHA-256 of the source URL ([`cache_filename`]) |
//! | **Download** | [`download`]: cache check, GET, `.part` then rename |
//! | **Attachments** | graph query + album flattening |
//! | **Per-entry rules** | [`MediaResolver`] |
//!
//! The module is split into:
//! - **Backend**: the transport trait, its error type and the test mock
//! - **Cache**: naming and download counters
//! - **Operations**: network-facing functions built on the backend
//! - **Resolver**: strategy and error policy applied to entries

pub mod backend;
mod cache;
pub mod http;
pub mod operations;
mod resolver;

pub use backend::{HttpBackend, HttpResponse, MediaError};
pub use cache::{DownloadStats, cache_filename, cached_path};
pub use http::ReqwestBackend;
pub use operations::{Download, download};
pub use resolver::{MediaResolver, PICTURES_DIR};
