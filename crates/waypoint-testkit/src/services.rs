//! Counting scoped services for disposal assertions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use waypoint_core::scope::ScopedService;

/// Shared disposal counter, cloneable into page factories.
#[derive(Clone, Default)]
pub struct DisposalCounter {
    count: Arc<AtomicUsize>,
}

impl DisposalCounter {
    /// How many services tied to this counter have been disposed.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// A scoped service that bumps its counter exactly once when its scope is
/// disposed.
pub struct CountingService {
    counter: DisposalCounter,
}

impl CountingService {
    /// A service reporting into `counter`.
    pub fn new(counter: DisposalCounter) -> Arc<Self> {
        Arc::new(Self { counter })
    }
}

impl ScopedService for CountingService {
    fn on_disposed(&self) {
        self.counter.count.fetch_add(1, Ordering::SeqCst);
    }
}
