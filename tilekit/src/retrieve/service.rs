//! Prioritized retrieval service backed by a worker thread pool.
//!
//! Retrievals are ordered by priority (higher values first), then by start
//! order (FIFO within the same priority).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tilekit::retrieve::{
//!     Caller, DefaultTransport, PooledRetrievalService, RetrievalProperties,
//!     RetrievalService, RetrievalServiceConfig,
//! };
//! use url::Url;
//!
//! let service = PooledRetrievalService::new(
//!     RetrievalServiceConfig::default(),
//!     Arc::new(DefaultTransport::new()),
//! );
//!
//! let retrieval = service.retrieve(
//!     &Caller::new("example"),
//!     Url::parse("https://tiles.example.com/0/0/0.png").unwrap(),
//!     RetrievalProperties::default(),
//! );
//! retrieval.start();
//! let result = retrieval.wait_and_get_result();
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, debug_span, info, warn};
use url::Url;

use super::error::RetrievalError;
use super::retrieval::{
    Caller, Retrieval, RetrievalListener, RetrievalProperties, RetrievalScheduler, RetrievalState,
};
use super::transport::Transport;

/// Default number of worker threads.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Issues retrievals. The bridge depends only on this contract.
pub trait RetrievalService: Send + Sync {
    /// Create a retrieval in the `Created` state. It is scheduled on `start()`.
    fn retrieve(&self, caller: &Caller, url: Url, properties: RetrievalProperties) -> Arc<Retrieval>;
}

/// Configuration for [`PooledRetrievalService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalServiceConfig {
    pub pool_size: usize,
}

impl Default for RetrievalServiceConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl RetrievalServiceConfig {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }
}

// =============================================================================
// Queue
// =============================================================================

struct QueuedRetrieval {
    retrieval: Arc<Retrieval>,
    priority: i32,
    sequence: u64,
}

impl PartialEq for QueuedRetrieval {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueuedRetrieval {}

impl PartialOrd for QueuedRetrieval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedRetrieval {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then lower sequence first
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ordering => ordering,
        }
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedRetrieval>,
    shutdown: bool,
}

// =============================================================================
// Shared state
// =============================================================================

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
    transport: Arc<dyn Transport>,
    listeners: DashMap<Caller, Vec<Arc<dyn RetrievalListener>>>,
    sequence: AtomicU64,
}

impl RetrievalScheduler for Shared {
    fn schedule(&self, retrieval: Arc<Retrieval>) -> Result<(), RetrievalError> {
        let mut queue = self.queue.lock();
        if queue.shutdown {
            return Err(RetrievalError::ServiceShutdown);
        }
        let priority = retrieval.priority();
        queue.heap.push(QueuedRetrieval {
            retrieval,
            priority,
            sequence: self.sequence.fetch_add(1, AtomicOrdering::Relaxed),
        });
        self.available.notify_one();
        Ok(())
    }

    fn state_changed(&self, retrieval: &Retrieval, state: RetrievalState) {
        // Clone out so listeners run without holding the shard lock
        let listeners = self
            .listeners
            .get(retrieval.caller())
            .map(|entry| entry.value().clone());

        if let Some(listeners) = listeners {
            for listener in listeners {
                listener.state_changed(retrieval, state);
            }
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Bounded worker pool resolving retrievals through a [`Transport`].
pub struct PooledRetrievalService {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl PooledRetrievalService {
    /// Spawn the worker pool.
    pub fn new(config: RetrievalServiceConfig, transport: Arc<dyn Transport>) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            transport,
            listeners: DashMap::new(),
            sequence: AtomicU64::new(0),
        });

        let pool_size = config.pool_size.max(1);
        let workers = (0..pool_size)
            .filter_map(|index| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("tilekit-retrieval-{}", index))
                    .spawn(move || worker_loop(shared))
                    .map_err(|e| warn!(error = %e, "Failed to spawn retrieval worker"))
                    .ok()
            })
            .collect::<Vec<_>>();

        info!(workers = workers.len(), "Retrieval service started");

        Self {
            shared,
            workers: Mutex::new(workers),
            next_id: AtomicU64::new(1),
        }
    }

    /// Route state changes of retrievals issued for `caller` to `listener`.
    pub fn add_listener(&self, caller: &Caller, listener: Arc<dyn RetrievalListener>) {
        self.shared
            .listeners
            .entry(caller.clone())
            .or_default()
            .push(listener);
    }

    /// Drop every listener registered for `caller`.
    pub fn remove_listeners(&self, caller: &Caller) {
        self.shared.listeners.remove(caller);
    }

    /// Number of retrievals waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().heap.len()
    }

    /// Whether `shutdown` has run.
    pub fn is_shutdown(&self) -> bool {
        self.shared.queue.lock().shutdown
    }

    /// Cancel queued retrievals and join the workers.
    ///
    /// Retrievals already running finish normally. Idempotent.
    pub fn shutdown(&self) {
        let drained: Vec<QueuedRetrieval> = {
            let mut queue = self.shared.queue.lock();
            if queue.shutdown {
                return;
            }
            queue.shutdown = true;
            self.shared.available.notify_all();
            queue.heap.drain().collect()
        };

        for queued in &drained {
            queued.retrieval.cancel();
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                warn!("Retrieval worker panicked");
            }
        }

        info!(canceled = drained.len(), "Retrieval service shut down");
    }
}

impl RetrievalService for PooledRetrievalService {
    fn retrieve(&self, caller: &Caller, url: Url, properties: RetrievalProperties) -> Arc<Retrieval> {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        let scheduler = Arc::downgrade(&self.shared) as Weak<dyn RetrievalScheduler>;
        Arc::new(Retrieval::new(id, caller.clone(), url, properties, scheduler))
    }
}

impl Drop for PooledRetrievalService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(queued) = queue.heap.pop() {
                    break Some(queued);
                }
                if queue.shutdown {
                    break None;
                }
                shared.available.wait(&mut queue);
            }
        };

        match next {
            Some(queued) => run_retrieval(&shared, &queued.retrieval),
            None => return,
        }
    }
}

fn run_retrieval(shared: &Shared, retrieval: &Retrieval) {
    let span = debug_span!(
        "retrieval",
        id = retrieval.id(),
        caller = %retrieval.caller(),
        url = %retrieval.url()
    );
    let _enter = span.enter();

    if !retrieval.begin() {
        debug!("Skipping canceled retrieval");
        return;
    }

    let outcome = shared
        .transport
        .fetch(retrieval.url(), retrieval.properties());

    if let Err(ref e) = outcome {
        debug!(error = %e, "Retrieval failed");
    }

    retrieval.finish(outcome);
}
