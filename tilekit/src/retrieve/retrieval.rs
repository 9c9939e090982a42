//! A single prioritized fetch and its lifecycle.
//!
//! A [`Retrieval`] is created by a [`RetrievalService`](super::RetrievalService)
//! in [`RetrievalState::Created`], handed back to the caller, and only
//! scheduled when the caller invokes [`Retrieval::start`]. The caller then
//! blocks in [`Retrieval::wait_and_get_result`] until a worker drives it to a
//! terminal state.
//!
//! ```text
//! Created -> Started -> Running -> Completed | Failed
//!    |          |          |
//!    +----------+----------+----> Canceled
//! ```
//!
//! Cancellation is cooperative. A retrieval that has not reached a worker is
//! canceled immediately; a running one is marked and the worker discards its
//! outcome when the transport returns.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tracing::debug;
use url::Url;

use super::error::RetrievalError;

/// Priority for requests a user is waiting on.
pub const PRIORITY_FOREGROUND: i32 = 100;

/// Priority for background tile loading.
pub const PRIORITY_BACKGROUND: i32 = 0;

/// Identity of the component that requested a retrieval.
///
/// Used in diagnostics and to route state changes to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Caller(Arc<str>);

impl Caller {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Caller {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Per-request transfer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalProperties {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// When false, intermediate caches are asked to revalidate.
    pub use_cache: bool,
    /// Higher values are served first.
    pub priority: i32,
}

impl Default for RetrievalProperties {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(20),
            use_cache: true,
            priority: PRIORITY_BACKGROUND,
        }
    }
}

impl RetrievalProperties {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Lifecycle state of a [`Retrieval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalState {
    Created,
    Started,
    Running,
    Completed,
    Canceled,
    Failed,
}

impl RetrievalState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RetrievalState::Completed | RetrievalState::Canceled | RetrievalState::Failed
        )
    }
}

/// Outcome of a finished retrieval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    /// Payload, absent for empty responses and failures
    pub data: Option<Bytes>,
    pub content_type: Option<String>,
    pub content_length: u64,
    pub error: Option<RetrievalError>,
}

/// Bytes produced by a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Receives every state transition of retrievals issued for a caller.
pub trait RetrievalListener: Send + Sync {
    fn state_changed(&self, retrieval: &Retrieval, state: RetrievalState);
}

/// The service side of a retrieval: queueing and listener routing.
pub trait RetrievalScheduler: Send + Sync {
    /// Enqueue a started retrieval.
    fn schedule(&self, retrieval: Arc<Retrieval>) -> Result<(), RetrievalError>;

    /// Called after every transition, outside the retrieval's lock.
    fn state_changed(&self, retrieval: &Retrieval, state: RetrievalState);
}

struct Inner {
    state: RetrievalState,
    result: RetrievalResult,
}

/// A single in-flight or completed fetch.
pub struct Retrieval {
    id: u64,
    caller: Caller,
    url: Url,
    properties: RetrievalProperties,
    inner: Mutex<Inner>,
    finished: Condvar,
    canceled: AtomicBool,
    scheduler: Weak<dyn RetrievalScheduler>,
}

impl Retrieval {
    /// Create a retrieval in the `Created` state.
    pub fn new(
        id: u64,
        caller: Caller,
        url: Url,
        properties: RetrievalProperties,
        scheduler: Weak<dyn RetrievalScheduler>,
    ) -> Self {
        Self {
            id,
            caller,
            url,
            properties,
            inner: Mutex::new(Inner {
                state: RetrievalState::Created,
                result: RetrievalResult::default(),
            }),
            finished: Condvar::new(),
            canceled: AtomicBool::new(false),
            scheduler,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn properties(&self) -> &RetrievalProperties {
        &self.properties
    }

    pub fn priority(&self) -> i32 {
        self.properties.priority
    }

    pub fn state(&self) -> RetrievalState {
        self.inner.lock().state
    }

    /// Whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Move to `Started` and hand the retrieval to its scheduler.
    ///
    /// Has no effect unless the retrieval is still `Created`.
    pub fn start(self: &Arc<Self>) {
        if !self.transition(RetrievalState::Created, RetrievalState::Started) {
            debug!(id = self.id, url = %self.url, "Start ignored, retrieval already started");
            return;
        }

        // A listener may cancel on Started
        if self.state() != RetrievalState::Started {
            return;
        }

        let scheduled = match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.schedule(Arc::clone(self)),
            None => Err(RetrievalError::ServiceShutdown),
        };
        if let Err(e) = scheduled {
            self.fail(e);
        }
    }

    /// Worker-side transition to `Running`.
    ///
    /// Returns false if the retrieval was canceled and must be skipped.
    pub fn begin(&self) -> bool {
        if self.is_canceled() {
            return false;
        }
        self.transition(RetrievalState::Started, RetrievalState::Running)
    }

    /// Worker-side completion with the transport outcome.
    ///
    /// If cancellation was requested while running, the outcome is discarded.
    pub fn finish(&self, outcome: Result<TransportResponse, RetrievalError>) {
        if self.is_canceled() {
            self.set_terminal(RetrievalState::Canceled, RetrievalResult::default());
            return;
        }

        match outcome {
            Ok(response) => {
                let content_length = response.body.len() as u64;
                let data = if response.body.is_empty() {
                    None
                } else {
                    Some(response.body)
                };
                self.set_terminal(
                    RetrievalState::Completed,
                    RetrievalResult {
                        data,
                        content_type: response.content_type,
                        content_length,
                        error: None,
                    },
                );
            }
            Err(e) => self.fail(e),
        }
    }

    /// Mark the retrieval failed with `error`.
    pub fn fail(&self, error: RetrievalError) {
        self.set_terminal(
            RetrievalState::Failed,
            RetrievalResult {
                error: Some(error),
                ..RetrievalResult::default()
            },
        );
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);

        let state = self.state();
        if matches!(state, RetrievalState::Created | RetrievalState::Started) {
            self.set_terminal(RetrievalState::Canceled, RetrievalResult::default());
        }
    }

    /// Block until the retrieval is terminal.
    ///
    /// Returns `None` if it was canceled.
    pub fn wait_and_get_result(&self) -> Option<RetrievalResult> {
        let mut inner = self.inner.lock();
        while !inner.state.is_terminal() {
            self.finished.wait(&mut inner);
        }
        match inner.state {
            RetrievalState::Canceled => None,
            _ => Some(inner.result.clone()),
        }
    }

    /// Like [`wait_and_get_result`](Self::wait_and_get_result) but gives up
    /// after `timeout`, returning `None` if still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RetrievalResult> {
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            self.finished
                .wait_while_for(&mut inner, |i| !i.state.is_terminal(), timeout);
        }
        match inner.state {
            RetrievalState::Completed | RetrievalState::Failed => Some(inner.result.clone()),
            _ => None,
        }
    }

    fn transition(&self, from: RetrievalState, to: RetrievalState) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.state != from {
                return false;
            }
            inner.state = to;
        }
        self.notify(to);
        true
    }

    fn set_terminal(&self, state: RetrievalState, result: RetrievalResult) {
        {
            let mut inner = self.inner.lock();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = state;
            inner.result = result;
            self.finished.notify_all();
        }
        self.notify(state);
    }

    fn notify(&self, state: RetrievalState) {
        debug!(id = self.id, caller = %self.caller, url = %self.url, ?state, "Retrieval state changed");
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.state_changed(self, state);
        }
    }
}

impl fmt::Debug for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrieval")
            .field("id", &self.id)
            .field("caller", &self.caller)
            .field("url", &self.url.as_str())
            .field("priority", &self.properties.priority)
            .field("state", &self.state())
            .finish()
    }
}
