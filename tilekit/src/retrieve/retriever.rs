//! Retrievers: one fetch of one URL, validated and post-processed.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use super::error::RetrievalError;
use super::fetch::{FetchRequest, Fetcher, RESPONSE_NONE, RESPONSE_OK};

/// Longest server message kept in a [`RetrievalError::ServerMessage`].
const MAX_SERVER_MESSAGE: usize = 512;

/// Progress of a [`Retriever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverState {
    NotStarted,
    Connecting,
    Reading,
    Successful,
    Error,
    /// No response; the underlying retrieval was canceled
    Interrupted,
}

/// Handles a successful payload, e.g. by saving it to the file store.
///
/// Returns the bytes the retriever reports as its result.
pub trait RetrievalPostProcessor: Send + Sync {
    fn process(&self, data: Bytes, content_type: Option<&str>) -> Result<Bytes, RetrievalError>;
}

/// Post-processor that returns the payload untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RetrievalPostProcessor for PassThrough {
    fn process(&self, data: Bytes, _content_type: Option<&str>) -> Result<Bytes, RetrievalError> {
        Ok(data)
    }
}

/// A single fetch operation produced by a retriever factory.
pub trait Retriever: Send {
    fn url(&self) -> &Url;

    fn state(&self) -> RetrieverState;

    /// Response code of the last attempt, if any.
    fn response_code(&self) -> Option<i32>;

    fn content_type(&self) -> Option<&str>;

    /// Run the fetch.
    ///
    /// `Ok(None)` means the fetch was interrupted without a response.
    fn retrieve(&mut self) -> Result<Option<Bytes>, RetrievalError>;
}

/// Retriever that validates a [`Fetcher`] response like an HTTP client.
pub struct UrlRetriever {
    fetcher: Arc<dyn Fetcher>,
    request: FetchRequest,
    post_processor: Arc<dyn RetrievalPostProcessor>,
    state: RetrieverState,
    response_code: Option<i32>,
    content_type: Option<String>,
}

impl UrlRetriever {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        request: FetchRequest,
        post_processor: Arc<dyn RetrievalPostProcessor>,
    ) -> Self {
        Self {
            fetcher,
            request,
            post_processor,
            state: RetrieverState::NotStarted,
            response_code: None,
            content_type: None,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    fn fail(&mut self, error: RetrievalError) -> Result<Option<Bytes>, RetrievalError> {
        self.state = RetrieverState::Error;
        Err(error)
    }
}

impl Retriever for UrlRetriever {
    fn url(&self) -> &Url {
        &self.request.url
    }

    fn state(&self) -> RetrieverState {
        self.state
    }

    fn response_code(&self) -> Option<i32> {
        self.response_code
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn retrieve(&mut self) -> Result<Option<Bytes>, RetrievalError> {
        self.state = RetrieverState::Connecting;

        let response = match self.fetcher.fetch(&self.request) {
            Ok(response) => response,
            Err(e) => return self.fail(e),
        };
        self.response_code = Some(response.code);
        self.content_type = response.content_type.clone();

        if response.code == RESPONSE_NONE && response.body.is_none() {
            debug!(url = %self.request.url, "Retrieval interrupted");
            self.state = RetrieverState::Interrupted;
            return Ok(None);
        }

        if response.code != RESPONSE_OK {
            return self.fail(RetrievalError::HttpStatus {
                url: self.request.url.to_string(),
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let Some(body) = response.body else {
            return self.fail(RetrievalError::NoData {
                url: self.request.url.to_string(),
            });
        };

        let is_text = self
            .content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("text/"))
            .unwrap_or(false);
        if is_text {
            let mut message = String::from_utf8_lossy(&body).into_owned();
            if message.len() > MAX_SERVER_MESSAGE {
                let mut cut = MAX_SERVER_MESSAGE;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            warn!(url = %self.request.url, message = %message, "Server returned a text response");
            return self.fail(RetrievalError::ServerMessage {
                url: self.request.url.to_string(),
                message,
            });
        }

        self.state = RetrieverState::Reading;
        match self.post_processor.process(body, self.content_type.as_deref()) {
            Ok(data) => {
                self.state = RetrieverState::Successful;
                Ok(Some(data))
            }
            Err(e) => self.fail(e),
        }
    }
}
