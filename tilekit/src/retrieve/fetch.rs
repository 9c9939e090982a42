//! The generic "fetch bytes for a URL" contract.
//!
//! Retrievers built by the delegate pipeline talk to a [`Fetcher`]. The
//! [`HttpFetcher`] answers directly through the transport on the calling
//! thread; the [`RetrievalBridge`](super::RetrievalBridge) routes the same
//! request through the prioritized retrieval service.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::archive::{extract_entry, is_archive_content_type};
use super::error::RetrievalError;
use super::retrieval::{Caller, RetrievalProperties};
use super::transport::{content_type_for_path, DefaultTransport, Transport};

/// Response code reported for a successful fetch.
pub const RESPONSE_OK: i32 = 200;

/// Response code reported when there is no discernible response.
pub const RESPONSE_NONE: i32 = -1;

/// A request to fetch the bytes behind a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    /// Originating component, for diagnostics and listener routing
    pub caller: Caller,
    pub properties: RetrievalProperties,
    /// Archive entry to return instead of the archive itself
    pub extract_entry: Option<String>,
}

impl FetchRequest {
    pub fn new(url: Url, caller: Caller) -> Self {
        Self {
            url,
            caller,
            properties: RetrievalProperties::default(),
            extract_entry: None,
        }
    }

    pub fn with_properties(mut self, properties: RetrievalProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_extract_entry(mut self, entry: impl Into<String>) -> Self {
        self.extract_entry = Some(entry.into());
        self
    }
}

/// An HTTP-like response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub code: i32,
    pub message: Option<String>,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub body: Option<Bytes>,
}

impl FetchResponse {
    /// A 200/"OK" response carrying `body`.
    pub fn ok(body: Bytes, content_type: Option<String>) -> Self {
        Self {
            code: RESPONSE_OK,
            message: Some("OK".to_string()),
            content_type,
            content_length: body.len() as u64,
            body: Some(body),
        }
    }

    /// The "no discernible response" result used for cancellation.
    pub fn no_response() -> Self {
        Self {
            code: RESPONSE_NONE,
            message: None,
            content_type: None,
            content_length: 0,
            body: None,
        }
    }

    /// A non-success status without a body.
    pub fn status(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            content_type: None,
            content_length: 0,
            body: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == RESPONSE_OK
    }

    /// Replace the body with the requested archive entry when the payload is
    /// an archive. Other payloads pass through unchanged.
    pub fn extract_if_archive(mut self, entry: Option<&str>) -> Result<Self, RetrievalError> {
        let (Some(entry), Some(body)) = (entry, self.body.as_ref()) else {
            return Ok(self);
        };
        let is_archive = self
            .content_type
            .as_deref()
            .map(is_archive_content_type)
            .unwrap_or(false);
        if !is_archive {
            return Ok(self);
        }

        let data = extract_entry(body, entry)?;
        debug!(entry, bytes = data.len(), "Extracted archive entry");
        self.content_length = data.len() as u64;
        self.content_type = content_type_for_path(Path::new(entry)).map(str::to_string);
        self.body = Some(data);
        Ok(self)
    }
}

/// Fetches bytes for a URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, RetrievalError>;
}

/// Fetcher that calls the transport directly on the calling thread.
pub struct HttpFetcher {
    transport: Arc<dyn Transport>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(DefaultTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, RetrievalError> {
        match self.transport.fetch(&request.url, &request.properties) {
            Ok(response) => FetchResponse::ok(response.body, response.content_type)
                .extract_if_archive(request.extract_entry.as_deref()),
            // Status errors become responses so the retriever can validate them
            Err(RetrievalError::HttpStatus { code, message, .. }) => {
                Ok(FetchResponse::status(code, message))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::archive::tests::build_zip;
    use crate::retrieve::retrieval::TransportResponse;

    struct StaticTransport(Result<TransportResponse, RetrievalError>);

    impl Transport for StaticTransport {
        fn fetch(
            &self,
            _url: &Url,
            _properties: &RetrievalProperties,
        ) -> Result<TransportResponse, RetrievalError> {
            self.0.clone()
        }
    }

    fn request() -> FetchRequest {
        FetchRequest::new(Url::parse("http://tiles.test/0/0/0").unwrap(), Caller::new("t"))
    }

    #[test]
    fn test_ok_response() {
        let fetcher = HttpFetcher::with_transport(Arc::new(StaticTransport(Ok(TransportResponse {
            body: Bytes::from_static(b"img"),
            content_type: Some("image/png".to_string()),
        }))));

        let response = fetcher.fetch(&request()).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.message.as_deref(), Some("OK"));
        assert_eq!(response.content_length, 3);
    }

    #[test]
    fn test_status_error_becomes_response() {
        let fetcher = HttpFetcher::with_transport(Arc::new(StaticTransport(Err(
            RetrievalError::HttpStatus {
                url: "http://tiles.test/0/0/0".to_string(),
                code: 404,
                message: "Not Found".to_string(),
            },
        ))));

        let response = fetcher.fetch(&request()).unwrap();
        assert_eq!(response.code, 404);
        assert!(response.body.is_none());
    }

    #[test]
    fn test_extracts_archive_entry() {
        let zip = build_zip(&[("tile.png", b"inner")], true);
        let fetcher = HttpFetcher::with_transport(Arc::new(StaticTransport(Ok(TransportResponse {
            body: Bytes::from(zip),
            content_type: Some("application/zip".to_string()),
        }))));

        let response = fetcher
            .fetch(&request().with_extract_entry("tile.png"))
            .unwrap();
        assert_eq!(response.body.as_deref(), Some(&b"inner"[..]));
        assert_eq!(response.content_length, 5);
    }

    #[test]
    fn test_non_archive_ignores_extract_entry() {
        let response = FetchResponse::ok(Bytes::from_static(b"png"), Some("image/png".to_string()))
            .extract_if_archive(Some("tile.png"))
            .unwrap();
        assert_eq!(response.body.as_deref(), Some(&b"png"[..]));
    }
}
