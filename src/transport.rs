// HTTP transport seam. `UploadClient` hands a fully built request to a
// `Transport`; the real one is a blocking reqwest client, tests swap in a
// mock.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Body, Client};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

#[cfg(test)]
use mockall::automock;

use crate::errors::TransportError;

/// A POST ready to go on the wire.
pub struct OutgoingRequest {
    pub url: String,
    pub headers: HeaderMap,
    /// Exact number of bytes `body` will yield.
    pub content_length: u64,
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for OutgoingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingRequest")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// A completed exchange. The body is read lazily and released on drop.
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

#[cfg_attr(test, automock)]
pub trait Transport: Send + Sync {
    /// Send `request` as a POST. Errors mean the exchange did not complete;
    /// any HTTP status, including failures, comes back as `Ok`.
    fn post(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError>;
}

/// Blocking reqwest transport.
///
/// The underlying client is built per request so construction never fails;
/// a TLS backend problem shows up as a transport error on the first send.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    skip_verify: bool,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(skip_verify: bool) -> Self {
        HttpTransport {
            skip_verify,
            timeout: None,
        }
    }

    /// Bound the whole exchange. Without this the request may block forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn skip_verify(&self) -> bool {
        self.skip_verify
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .danger_accept_invalid_certs(self.skip_verify)
            .timeout(self.timeout)
            .build()
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError> {
        let client = self.client()?;
        let response = client
            .post(&request.url)
            .headers(request.headers)
            .body(Body::sized(request.body, request.content_length))
            .send()?;

        Ok(TransportResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: Box::new(response),
        })
    }
}
