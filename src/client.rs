//! HTTP client for the Digitraffic AIS REST API

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::debug;

use crate::errors::ExporterError;

/// Name of the header Digitraffic uses to identify API consumers
pub const DIGITRAFFIC_USER_HEADER: &str = "digitraffic-user";

/// Longest slice of an error response body kept in the error message
const ERROR_BODY_LIMIT: usize = 1024;

/// Source of JSON payloads.
///
/// Timeouts are the caller's responsibility, the vessels and locations
/// requests share one deadline.
pub trait PayloadSource: Send + Sync {
    /// Fetch and decode a JSON document.
    ///
    /// Documents nested deeper than serde_json's recursion limit (128 levels)
    /// fail to decode instead of exhausting the stack.
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Value, ExporterError>> + Send;
}

/// Digitraffic client using a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct DigitrafficClient {
    http: reqwest::Client,
}

impl DigitrafficClient {
    /// Create a client sending `user` in the `Digitraffic-User` header.
    ///
    /// An empty `user` omits the header.
    pub fn new(user: &str) -> Result<Self, ExporterError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !user.is_empty() {
            let value =
                HeaderValue::from_str(user).map_err(|e| ExporterError::ConfigurationError {
                    message: format!("Invalid Digitraffic user header: {}", e),
                })?;
            headers.insert(HeaderName::from_static(DIGITRAFFIC_USER_HEADER), value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http })
    }
}

impl PayloadSource for DigitrafficClient {
    async fn fetch_json(&self, url: &str) -> Result<Value, ExporterError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_prefix(response, ERROR_BODY_LIMIT).await;
            debug!(url, %status, "request rejected");
            return Err(ExporterError::HttpStatus {
                status,
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(url, bytes = bytes.len(), "fetched payload");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Read at most `limit` bytes of the body, ignoring read errors
async fn read_prefix(mut response: reqwest::Response, limit: usize) -> Vec<u8> {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            _ => break,
        }
    }
    body
}
