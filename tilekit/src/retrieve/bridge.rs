//! Adapter from the [`Fetcher`] contract to a [`RetrievalService`].
//!
//! The bridge turns a fetch request into a [`Retrieval`](super::Retrieval),
//! starts it, and blocks until the service finishes it. The outcome is
//! reported as an HTTP-like response so retrievers validate it the same way
//! they validate a direct fetch:
//!
//! | Retrieval outcome            | Bridge result                     |
//! |------------------------------|-----------------------------------|
//! | data present                 | `200 OK` with the data            |
//! | no data, error carried       | `Err(error)`                      |
//! | canceled                     | code `-1`, no message, no data    |
//! | anything else                | `Err(RetrievalError::NoData)`     |
//!
//! Archive payloads are unpacked when the request names an entry.

use std::sync::Arc;

use tracing::{debug, debug_span};

use super::error::RetrievalError;
use super::fetch::{FetchRequest, FetchResponse, Fetcher};
use super::service::RetrievalService;

/// [`Fetcher`] backed by the prioritized retrieval service.
pub struct RetrievalBridge {
    service: Arc<dyn RetrievalService>,
}

impl RetrievalBridge {
    pub fn new(service: Arc<dyn RetrievalService>) -> Self {
        Self { service }
    }
}

impl Fetcher for RetrievalBridge {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, RetrievalError> {
        let span = debug_span!("bridge", caller = %request.caller, url = %request.url);
        let _enter = span.enter();

        let retrieval = self.service.retrieve(
            &request.caller,
            request.url.clone(),
            request.properties.clone(),
        );
        retrieval.start();
        let result = retrieval.wait_and_get_result();

        if let Some(result) = result {
            if let Some(data) = result.data {
                let mut response = FetchResponse::ok(data, result.content_type);
                response.content_length = result.content_length;
                return response.extract_if_archive(request.extract_entry.as_deref());
            }
            if let Some(error) = result.error {
                return Err(error);
            }
        }

        if retrieval.is_canceled() {
            debug!("Retrieval canceled, returning empty response");
            return Ok(FetchResponse::no_response());
        }

        Err(RetrievalError::NoData {
            url: request.url.to_string(),
        })
    }
}
