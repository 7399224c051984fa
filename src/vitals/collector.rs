//! Web-vitals collection over an injected platform source.
//!
//! The collector registers one observer per performance entry kind and
//! folds incoming entries into a shared metrics state. The platform is
//! abstracted behind [`MetricsSource`] so the collector runs unchanged
//! against a real browser bridge or the in-process [`SimulatedSource`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::vitals::metrics::DetailedWebVitals;

/// Performance entry categories, one observer each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    LayoutShift,
    LargestContentfulPaint,
    FirstInput,
    Paint,
    Event,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        EntryKind::LayoutShift,
        EntryKind::LargestContentfulPaint,
        EntryKind::FirstInput,
        EntryKind::Paint,
        EntryKind::Event,
    ];
}

/// One performance entry as delivered by the platform.
///
/// Field meaning depends on the kind: layout shifts carry `value` and
/// `had_recent_input`, paint entries carry `name` and `start_time`, input
/// and event entries carry the processing timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceEntry {
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    pub value: f64,
    pub had_recent_input: bool,
    pub processing_start: f64,
    pub processing_end: f64,
}

/// Navigation-derived timings available once per page load.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationTiming {
    pub ttfb: Option<f64>,
    pub dom_content_loaded: Option<f64>,
    pub load_complete: Option<f64>,
    pub first_paint: Option<f64>,
}

/// Environment facts reported by the platform source.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    pub user_agent: String,
    pub device: String,
    pub connection: String,
}

/// Observer registration failure.
#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("entry kind {0:?} is not supported by this source")]
    Unsupported(EntryKind),

    #[error("observer registration failed: {0}")]
    Registration(String),
}

/// Callback invoked with each delivered entry batch.
pub type EntryCallback = Box<dyn Fn(&[PerformanceEntry]) + Send + Sync>;

/// A registered observer. Disconnecting is idempotent; dropping without
/// disconnecting leaves the observer attached, as the platform would.
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(on_disconnect: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(on_disconnect)),
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

/// Capability-gated source of performance entries.
///
/// Implementations bridge a real platform (a browser's observer API) or
/// simulate one for tests; absence of a capability degrades the collector
/// to a no-op for that metric only.
pub trait MetricsSource: Send + Sync {
    /// Whether this source can observe `kind` at all.
    fn is_supported(&self, kind: EntryKind) -> bool;

    /// Register an observer for `kind`.
    fn subscribe(&self, kind: EntryKind, callback: EntryCallback)
        -> Result<Subscription, ObserveError>;

    /// Navigation timings for the current page load, when available.
    fn navigation_timing(&self) -> Option<NavigationTiming>;

    /// Environment facts for snapshot/baseline records.
    fn context(&self) -> SourceContext;
}

#[derive(Debug, Clone, Copy, Default)]
struct ObservedMetrics {
    cls: Option<f64>,
    lcp: Option<f64>,
    fid: Option<f64>,
    fcp: Option<f64>,
    inp: Option<f64>,
}

/// Collects web vitals from a [`MetricsSource`].
pub struct VitalsCollector<M: MetricsSource> {
    source: M,
    state: Arc<Mutex<ObservedMetrics>>,
    subscriptions: Mutex<Vec<Subscription>>,
    started: AtomicBool,
}

impl<M: MetricsSource> VitalsCollector<M> {
    pub fn new(source: M) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(ObservedMetrics::default())),
            subscriptions: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    /// Register one observer per entry kind.
    ///
    /// Each registration is independently guarded: a kind the source does
    /// not support, or a registration failure, is logged and skipped
    /// without affecting the others. Calling `start` again without an
    /// intervening `cleanup` is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut subscriptions = self.subscriptions.lock().unwrap();
        for kind in EntryKind::ALL {
            if !self.source.is_supported(kind) {
                warn!("metrics source does not support {:?}, skipping", kind);
                continue;
            }
            match self.source.subscribe(kind, self.callback_for(kind)) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(error) => warn!("failed to observe {:?}: {}", kind, error),
            }
        }
        debug!("vitals collector started {} observers", subscriptions.len());
    }

    /// Snapshot the collected metrics for `page`.
    pub fn snapshot(&self, page: &str) -> DetailedWebVitals {
        let observed = *self.state.lock().unwrap();
        let timing = self.source.navigation_timing().unwrap_or_default();
        let context = self.source.context();

        DetailedWebVitals {
            cls: observed.cls,
            lcp: observed.lcp,
            fid: observed.fid,
            fcp: observed.fcp,
            ttfb: timing.ttfb,
            inp: observed.inp,
            dom_content_loaded: timing.dom_content_loaded,
            load_complete: timing.load_complete,
            first_paint: timing.first_paint,
            device: context.device,
            connection: context.connection,
            ..DetailedWebVitals::empty(page)
        }
    }

    /// Disconnect all registered observers.
    ///
    /// Idempotent: safe to call repeatedly or with nothing registered.
    pub fn cleanup(&self) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        for subscription in subscriptions.iter_mut() {
            subscription.disconnect();
        }
        subscriptions.clear();
        self.started.store(false, Ordering::SeqCst);
    }

    fn callback_for(&self, kind: EntryKind) -> EntryCallback {
        let state = Arc::clone(&self.state);
        match kind {
            // CLS sums shift values, excluding shifts caused by recent input
            EntryKind::LayoutShift => Box::new(move |entries| {
                let mut observed = state.lock().unwrap();
                for entry in entries {
                    if !entry.had_recent_input {
                        observed.cls = Some(observed.cls.unwrap_or(0.0) + entry.value);
                    }
                }
            }),
            // The observer delivers a growing candidate list; last wins
            EntryKind::LargestContentfulPaint => Box::new(move |entries| {
                if let Some(last) = entries.last() {
                    state.lock().unwrap().lcp = Some(last.start_time);
                }
            }),
            // Only the first input counts; later batches are ignored
            EntryKind::FirstInput => Box::new(move |entries| {
                let mut observed = state.lock().unwrap();
                if observed.fid.is_none() {
                    if let Some(first) = entries.first() {
                        observed.fid = Some(first.processing_start - first.start_time);
                    }
                }
            }),
            // FCP is the paint entry named "first-contentful-paint"
            EntryKind::Paint => Box::new(move |entries| {
                for entry in entries {
                    if entry.name == "first-contentful-paint" {
                        state.lock().unwrap().fcp = Some(entry.start_time);
                    }
                }
            }),
            // INP tracks the worst interaction latency seen so far
            EntryKind::Event => Box::new(move |entries| {
                let mut observed = state.lock().unwrap();
                for entry in entries {
                    let latency = entry.processing_end - entry.start_time;
                    observed.inp = Some(observed.inp.map_or(latency, |inp| inp.max(latency)));
                }
            }),
        }
    }
}

// ==================== Simulated Source ====================

#[derive(Default)]
struct SimulatedInner {
    subscribers: Mutex<Vec<(u64, EntryKind, Arc<EntryCallback>)>>,
    next_id: AtomicU64,
    unsupported: Mutex<Vec<EntryKind>>,
    failing: Mutex<Vec<EntryKind>>,
    navigation: Mutex<Option<NavigationTiming>>,
    context: Mutex<SourceContext>,
}

/// In-process [`MetricsSource`] for tests and native embedding.
///
/// Entries pushed through [`SimulatedSource::emit`] are delivered
/// synchronously to every live observer of the kind.
#[derive(Clone, Default)]
pub struct SimulatedSource {
    inner: Arc<SimulatedInner>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `kind` as unsupported (`is_supported` returns false).
    pub fn without_support(self, kind: EntryKind) -> Self {
        self.inner.unsupported.lock().unwrap().push(kind);
        self
    }

    /// Make registration for `kind` fail even though it is "supported".
    pub fn with_failing(self, kind: EntryKind) -> Self {
        self.inner.failing.lock().unwrap().push(kind);
        self
    }

    pub fn set_navigation_timing(&self, timing: NavigationTiming) {
        *self.inner.navigation.lock().unwrap() = Some(timing);
    }

    pub fn set_context(&self, context: SourceContext) {
        *self.inner.context.lock().unwrap() = context;
    }

    /// Deliver a batch of entries to every observer of `kind`.
    pub fn emit(&self, kind: EntryKind, entries: &[PerformanceEntry]) {
        let callbacks: Vec<Arc<EntryCallback>> = {
            let subscribers = self.inner.subscribers.lock().unwrap();
            subscribers
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, cb)| Arc::clone(cb))
                .collect()
        };
        for callback in callbacks {
            callback(entries);
        }
    }

    /// Number of live observers. Test helper.
    pub fn observer_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}

impl MetricsSource for SimulatedSource {
    fn is_supported(&self, kind: EntryKind) -> bool {
        !self.inner.unsupported.lock().unwrap().contains(&kind)
    }

    fn subscribe(
        &self,
        kind: EntryKind,
        callback: EntryCallback,
    ) -> Result<Subscription, ObserveError> {
        if !self.is_supported(kind) {
            return Err(ObserveError::Unsupported(kind));
        }
        if self.inner.failing.lock().unwrap().contains(&kind) {
            return Err(ObserveError::Registration(format!(
                "simulated registration failure for {:?}",
                kind
            )));
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, kind, Arc::new(callback)));

        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            inner
                .subscribers
                .lock()
                .unwrap()
                .retain(|(sub_id, _, _)| *sub_id != id);
        }))
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        *self.inner.navigation.lock().unwrap()
    }

    fn context(&self) -> SourceContext {
        self.inner.context.lock().unwrap().clone()
    }
}
