//! Byte transports used by retrieval workers.
//!
//! [`DefaultTransport`] serves `http`/`https` through a blocking `reqwest`
//! client and `file` URLs straight from the filesystem. Tests and hosts can
//! substitute any [`Transport`].

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use tracing::debug;
use url::Url;

use super::error::RetrievalError;
use super::retrieval::{RetrievalProperties, TransportResponse};

/// Fetches the bytes behind a URL.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        url: &Url,
        properties: &RetrievalProperties,
    ) -> Result<TransportResponse, RetrievalError>;
}

/// HTTP and file transport.
///
/// One `reqwest` client is kept per connect timeout; read timeouts are applied
/// per request.
#[derive(Default)]
pub struct DefaultTransport {
    clients: DashMap<Duration, reqwest::blocking::Client>,
}

impl DefaultTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self, connect_timeout: Duration) -> Result<reqwest::blocking::Client, RetrievalError> {
        if let Some(client) = self.clients.get(&connect_timeout) {
            return Ok(client.clone());
        }

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("tilekit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrievalError::Network {
                url: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        self.clients.insert(connect_timeout, client.clone());
        Ok(client)
    }

    fn fetch_http(
        &self,
        url: &Url,
        properties: &RetrievalProperties,
    ) -> Result<TransportResponse, RetrievalError> {
        let client = self.client(properties.connect_timeout)?;

        let mut request = client.get(url.as_str()).timeout(properties.read_timeout);
        if !properties.use_cache {
            request = request.header(CACHE_CONTROL, "no-cache").header(PRAGMA, "no-cache");
        }

        let response = request.send().map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::HttpStatus {
                url: url.to_string(),
                code: status.as_u16() as i32,
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response.bytes().map_err(|e| map_reqwest_error(url, e))?;
        debug!(url = %url, bytes = body.len(), "HTTP fetch complete");

        Ok(TransportResponse { body, content_type })
    }
}

impl Transport for DefaultTransport {
    fn fetch(
        &self,
        url: &Url,
        properties: &RetrievalProperties,
    ) -> Result<TransportResponse, RetrievalError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url, properties),
            "file" => fetch_file(url),
            other => Err(RetrievalError::UnsupportedScheme {
                url: url.to_string(),
                scheme: other.to_string(),
            }),
        }
    }
}

/// Read a `file://` URL.
pub fn fetch_file(url: &Url) -> Result<TransportResponse, RetrievalError> {
    let path = url.to_file_path().map_err(|_| RetrievalError::Io {
        path: url.to_string(),
        reason: "not a local file path".to_string(),
    })?;

    let body = std::fs::read(&path).map_err(|e| RetrievalError::io(path.display().to_string(), &e))?;

    Ok(TransportResponse {
        body: Bytes::from(body),
        content_type: content_type_for_path(&path).map(str::to_string),
    })
}

/// Guess a content type from a file extension.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "zip" => "application/zip",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "xml" => "text/xml",
        _ => return None,
    };
    Some(content_type)
}

fn map_reqwest_error(url: &Url, err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        RetrievalError::Timeout {
            url: url.to_string(),
        }
    } else {
        RetrievalError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"\x89PNG")
            .unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let response = DefaultTransport::new()
            .fetch(&url, &RetrievalProperties::default())
            .unwrap();
        assert_eq!(&response.body[..], b"\x89PNG");
        assert_eq!(response.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.png")).unwrap();
        let result = DefaultTransport::new().fetch(&url, &RetrievalProperties::default());
        assert!(matches!(result, Err(RetrievalError::Io { .. })));
    }

    #[test]
    fn test_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/tile.png").unwrap();
        let result = DefaultTransport::new().fetch(&url, &RetrievalProperties::default());
        assert!(matches!(
            result,
            Err(RetrievalError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for_path(Path::new("a/b.zip")), Some("application/zip"));
        assert_eq!(content_type_for_path(Path::new("a/b")), None);
    }
}
