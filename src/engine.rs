//! The stub registry and dispatch engine.

use crate::hook::HttpClientHook;
use crate::request::HttpRequest;
use crate::response::StubResponse;
use crate::stub::{Stub, StubBuilder};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An error surfaced while dispatching or rendering stubbed traffic.
///
/// Dispatch itself only ever produces [`Error::NoMatch`]; the remaining
/// variants belong to transport adapters that cannot render a response
/// the engine handed them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered stub accepted the request.
    #[error("no registered stub matched the request")]
    NoMatch(HttpRequest),
    /// The stub response declares no status code.
    #[error("stub response declares no status code")]
    NoStatus,
    /// The stub response cannot be rendered by the transport.
    #[error("stub response could not be rendered")]
    InvalidResponse,
    /// The stub response carries no body bytes where some are required.
    #[error("stub response carries no body data")]
    NoData,
}

static SHARED: Lazy<Stubbles> = Lazy::new(Stubbles::new);

/// The stub registry: an ordered collection of stubs, the dispatch loop,
/// and the lifecycle of the interception hooks.
///
/// Registration order is priority order; dispatch answers from the first
/// matching stub. All operations are safe to call concurrently from the
/// threads the surrounding transport layer uses to deliver intercepted
/// requests.
pub struct Stubbles {
    stubs: RwLock<Vec<Arc<Stub>>>,
    hooks: Mutex<Vec<Box<dyn HttpClientHook>>>,
    running: Mutex<bool>,
    requests_total: AtomicU64,
    requests_matched: AtomicU64,
    requests_unmatched: AtomicU64,
}

impl Stubbles {
    /// Creates an independent engine with no stubs and no hooks.
    pub fn new() -> Self {
        Self {
            stubs: RwLock::new(Vec::new()),
            hooks: Mutex::new(Vec::new()),
            running: Mutex::new(false),
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
        }
    }

    /// The process-wide shared engine.
    pub fn shared() -> &'static Stubbles {
        &SHARED
    }

    /// Whether the engine is currently intercepting requests.
    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Starts intercepting requests, loading every registered hook.
    /// A no-op if already running.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if *running {
            return;
        }
        for hook in self.hooks.lock().iter() {
            debug!(hook = hook.name(), "loading hook");
            hook.load();
        }
        *running = true;
        debug!("interception started");
    }

    /// Stops intercepting requests without touching the stub list.
    /// A no-op if already stopped.
    pub fn pause(&self) {
        let mut running = self.running.lock();
        if !*running {
            return;
        }
        for hook in self.hooks.lock().iter() {
            debug!(hook = hook.name(), "unloading hook");
            hook.unload();
        }
        *running = false;
        debug!("interception paused");
    }

    /// Stops intercepting requests and discards all stubs.
    pub fn stop(&self) {
        self.pause();
        self.reset();
    }

    /// Registers a stub. The returned handle is the stub's identity:
    /// keep it to assert on recorded calls later.
    pub fn register(&self, stub: Stub) -> Arc<Stub> {
        let stub = Arc::new(stub);
        self.stubs.write().push(Arc::clone(&stub));
        stub
    }

    /// Builds a stub from the given attributes and registers it.
    pub fn stub(&self, build: impl FnOnce(StubBuilder) -> StubBuilder) -> Arc<Stub> {
        self.register(build(Stub::builder()).build())
    }

    /// Discards all registered stubs.
    pub fn reset(&self) {
        self.stubs.write().clear();
    }

    pub fn stub_count(&self) -> usize {
        self.stubs.read().len()
    }

    /// Registers an interception hook, de-duplicated by kind: a hook
    /// whose name is already registered is dropped. Hooks load on the
    /// next stopped-to-running transition.
    pub fn register_hook(&self, hook: Box<dyn HttpClientHook>) {
        let mut hooks = self.hooks.lock();
        if hooks.iter().any(|existing| existing.name() == hook.name()) {
            return;
        }
        hooks.push(hook);
    }

    /// Matches the intercepted request against every registered stub in
    /// registration order and answers from the first match. Later stubs
    /// are not evaluated and record no call.
    ///
    /// A returned response may carry an explicit failure
    /// ([`StubResponse::is_failure`]); callers must surface that failure
    /// instead of rendering the response.
    pub fn dispatch(&self, request: &HttpRequest) -> Result<StubResponse, Error> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        // Snapshot so responders may re-enter the registry while we
        // iterate, and so registration never blocks on a slow responder.
        let stubs: Vec<Arc<Stub>> = self.stubs.read().clone();

        for stub in &stubs {
            if let Some(response) = stub.handle(request) {
                self.requests_matched.fetch_add(1, Ordering::Relaxed);
                info!(
                    stub = stub.name().unwrap_or("unnamed"),
                    method = ?request.method,
                    url = ?request.url,
                    "request matched stub"
                );
                return Ok(response);
            }
        }

        self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
        warn!(method = ?request.method, url = ?request.url, "no matching stub found");
        Err(Error::NoMatch(request.clone()))
    }

    /// Total requests dispatched through this engine.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Total requests answered by a stub.
    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    /// Total requests that matched no stub.
    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }
}

impl Default for Stubbles {
    fn default() -> Self {
        Self::new()
    }
}
