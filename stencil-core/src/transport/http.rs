//! # HTTP Transport
//!
//! The default [`Transport`] implementation, built on top of `reqwest`.
//!
//! Headers and the timeout from [`HttpOptions`] are validated once, when the transport is
//! built, and then applied to every request.
use super::{HttpOptions, Transport, TransportError};
use bytes::Bytes;
use reqwest::{
    StatusCode, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::str::FromStr;

/// A [`Transport`] performing plain `GET` requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport from the given options.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpTransport)` - The transport, ready to be shared between stores.
    /// * `Err(TransportError::InvalidConfiguration)` - If a header name or value is invalid.
    pub fn new(options: &HttpOptions) -> Result<Self, TransportError> {
        let headers = build_headers(options)?;

        let client = reqwest::Client::builder()
            .timeout(options.effective_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Bytes, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidRequest {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| classify(url, source))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| classify(url, source))?;

        if status != StatusCode::OK {
            return Err(TransportError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

fn classify(url: &str, source: reqwest::Error) -> TransportError {
    if source.is_builder() {
        TransportError::InvalidRequest {
            url: url.to_string(),
            reason: source.to_string(),
        }
    } else {
        TransportError::RequestFailed {
            url: url.to_string(),
            source,
        }
    }
}

fn build_headers(options: &HttpOptions) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::with_capacity(options.headers.len());
    for (k, v) in &options.headers {
        let key = HeaderName::from_str(k).map_err(|e| {
            TransportError::InvalidConfiguration(format!("invalid header key '{k}': {e}"))
        })?;
        let val = HeaderValue::from_str(v).map_err(|e| {
            TransportError::InvalidConfiguration(format!("invalid header value for key '{k}': {e}"))
        })?;
        headers.insert(key, val);
    }
    Ok(headers)
}
