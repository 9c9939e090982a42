//! Byte retrieval: the prioritized retrieval service and the fetch bridge.
//!
//! The pipeline asks a [`Fetcher`] for the bytes behind a URL. Two fetchers
//! are provided:
//!
//! - [`HttpFetcher`] fetches directly on the calling thread.
//! - [`RetrievalBridge`] hands the request to a [`RetrievalService`] and
//!   blocks until one of its workers has resolved it.
//!
//! [`PooledRetrievalService`] is the bundled service: a fixed pool of worker
//! threads draining a priority queue through a [`Transport`].

mod archive;
mod bridge;
mod error;
mod fetch;
mod retrieval;
mod retriever;
mod service;
mod transport;

pub use archive::{entry_names, extract_entry, is_archive_content_type, ARCHIVE_CONTENT_TYPES};
pub use bridge::RetrievalBridge;
pub use error::RetrievalError;
pub use fetch::{FetchRequest, FetchResponse, Fetcher, HttpFetcher, RESPONSE_NONE, RESPONSE_OK};
pub use retrieval::{
    Caller, Retrieval, RetrievalListener, RetrievalProperties, RetrievalResult,
    RetrievalScheduler, RetrievalState, TransportResponse, PRIORITY_BACKGROUND,
    PRIORITY_FOREGROUND,
};
pub use retriever::{PassThrough, RetrievalPostProcessor, Retriever, RetrieverState, UrlRetriever};
pub use service::{
    PooledRetrievalService, RetrievalService, RetrievalServiceConfig, DEFAULT_POOL_SIZE,
};
pub use transport::{content_type_for_path, fetch_file, DefaultTransport, Transport};
