//! Blocking `reqwest` backend.

use super::backend::{HttpBackend, HttpResponse, MediaError, redact_query};
use crate::config::HttpConfig;
use reqwest::blocking::Client;
use std::time::Duration;

pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    pub fn new(config: &HttpConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MediaError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpBackend for ReqwestBackend {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, MediaError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        // Paging links carry the access token in their query string; keep it
        // out of both the URL and reqwest's own message.
        let response = request.send().map_err(|e| MediaError::Request {
            url: redact_query(url).to_string(),
            message: e.without_url().to_string(),
        })?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: Box::new(response),
        })
    }
}
