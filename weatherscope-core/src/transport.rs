//! HTTP seam between the adapters and the network.
//!
//! Adapters only describe calls ([`OutboundCall`]) and interpret the raw
//! status + body that comes back; everything else belongs to a [`Transport`].

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// One outbound GET: target URL, query string pairs and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl OutboundCall {
    /// A GET to `url` with the `Content-type: application/json` header every
    /// provider call carries.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: vec![("Content-type".to_string(), "application/json".to_string())],
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and undecoded body of a completed call.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call never produced an HTTP response (DNS, refused connection, timeout).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Perform the call. Any HTTP status is a successful return; `Err` means
    /// no response at all.
    async fn get(&self, call: &OutboundCall) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, call: &OutboundCall) -> Result<RawResponse, TransportError> {
        let mut builder = self.http.get(&call.url).query(&call.query);
        for (name, value) in &call.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let res = builder.send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();

        debug!(url = %call.url, status, bytes = body.len(), "provider responded");

        Ok(RawResponse { status, body })
    }
}
