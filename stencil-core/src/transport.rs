//! # Registry Transport
//!
//! This module contains the seam between the descriptor cache and the network.
//!
//! Stores only ever need one operation from the network: download the body behind a URL.
//! The [`Transport`] trait captures exactly that, which keeps the refresh machinery agnostic of
//! the HTTP stack and lets tests plug an in-memory registry instead.
//!
//! ## Error classification
//!
//! * **`InvalidConfiguration`**: the transport itself could not be built (invalid header,
//!   TLS backend failure). No URL is involved yet.
//! * **`InvalidRequest`**: the request for a given URL could not be built (malformed URL).
//! * **`RequestFailed`**: the request was sent but no usable response came back
//!   (connection refused, DNS resolution, timeout, truncated body).
//! * **`UnexpectedStatus`**: the registry answered with something other than `200 OK`.
//!   The body is kept for diagnostics.
pub mod http;

pub use bytes::Bytes;
pub use http::HttpTransport;

use std::{collections::HashMap, future::Future, time::Duration};

/// Default time limit for a single registry request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid transport configuration: '{0}'")]
    InvalidConfiguration(String),
    #[error("Invalid request for '{url}': '{reason}'")]
    InvalidRequest { url: String, reason: String },
    #[error("Request to '{url}' failed: '{source}'")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{url}' failed with status {status}, response body: '{body}'")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },
}

/// Options applied to every request sent by [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Time limit for each request. A zero duration falls back to [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
    /// Extra headers added to every request (e.g. `Authorization`).
    pub headers: HashMap<String, String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
        }
    }
}

impl HttpOptions {
    pub(crate) fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }
}

/// Downloads raw bytes from a registry endpoint.
///
/// Implementations must only return `Ok` for a `200 OK` response.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, TransportError>> + Send;
}
