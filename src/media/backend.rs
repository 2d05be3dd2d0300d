//! HTTP backend trait and shared types.
//!
//! The [`HttpBackend`] trait is the only way the media pipeline touches the
//! network. The production implementation is
//! [`ReqwestBackend`](super::http::ReqwestBackend); tests use the recording
//! [`MockBackend`](tests::MockBackend).

use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
    #[error("attachment query for entry {entry} answered HTTP {status}")]
    GraphStatus { entry: String, status: u16 },
    #[error("attachments for entry {entry} are not valid JSON: {source}")]
    Graph {
        entry: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("the attachments media strategy needs an access token (--token)")]
    MissingToken,
}

/// Status and streaming body of a GET request.
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `url` without its query string, for error messages. Graph paging links
/// carry the access token in the query.
pub fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Blocking HTTP GET.
///
/// Transport failures are errors; any response that arrived, whatever its
/// status, is `Ok` so callers decide what a non-success status means.
pub trait HttpBackend {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, MediaError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    /// Canned reply for one URL.
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Body(Vec<u8>),
        Status(u16),
        Fail(String),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    /// Backend that serves canned replies keyed by URL and records every
    /// request. Unknown URLs answer 404.
    #[derive(Default)]
    pub struct MockBackend {
        replies: HashMap<String, MockReply>,
        requests: RefCell<Vec<RecordedRequest>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.replies
                .insert(url.to_string(), MockReply::Body(body.into()));
            self
        }

        pub fn with_json(self, url: &str, value: &serde_json::Value) -> Self {
            self.with_body(url, value.to_string())
        }

        pub fn with_status(mut self, url: &str, status: u16) -> Self {
            self.replies
                .insert(url.to_string(), MockReply::Status(status));
            self
        }

        pub fn with_failure(mut self, url: &str, message: &str) -> Self {
            self.replies
                .insert(url.to_string(), MockReply::Fail(message.to_string()));
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.borrow().clone()
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests.borrow().iter().filter(|r| r.url == url).count()
        }
    }

    impl HttpBackend for MockBackend {
        fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, MediaError> {
            self.requests.borrow_mut().push(RecordedRequest {
                url: url.to_string(),
                query: query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });

            let (status, body) = match self.replies.get(url) {
                Some(MockReply::Body(bytes)) => (200, bytes.clone()),
                Some(MockReply::Status(status)) => (*status, Vec::new()),
                Some(MockReply::Fail(message)) => {
                    return Err(MediaError::Request {
                        url: redact_query(url).to_string(),
                        message: message.clone(),
                    });
                }
                None => (404, Vec::new()),
            };
            Ok(HttpResponse {
                status,
                body: Box::new(Cursor::new(body)),
            })
        }
    }

    #[test]
    fn success_range() {
        let ok = HttpResponse {
            status: 204,
            body: Box::new(std::io::empty()),
        };
        let redirect = HttpResponse {
            status: 301,
            body: Box::new(std::io::empty()),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn redact_query_drops_token() {
        assert_eq!(
            redact_query("https://graph.example/v2.12/1/attachments?access_token=secret&after=x"),
            "https://graph.example/v2.12/1/attachments"
        );
        assert_eq!(redact_query("https://cdn.example/a.jpg"), "https://cdn.example/a.jpg");
    }

    #[test]
    fn mock_records_requests_and_defaults_to_404() {
        let mock = MockBackend::new().with_body("http://a/x", "bytes");
        let mut hit = mock.get("http://a/x", &[("k", "v")]).unwrap();
        let miss = mock.get("http://a/y", &[]).unwrap();

        let mut body = String::new();
        hit.body.read_to_string(&mut body).unwrap();
        assert_eq!(body, "bytes");
        assert_eq!(miss.status, 404);
        assert_eq!(
            mock.requests()[0].query,
            vec![("k".to_string(), "v".to_string())]
        );
        assert_eq!(mock.request_count("http://a/x"), 1);
    }
}
