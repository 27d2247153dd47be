//! Lifecycle event recorder.

use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use waypoint_core::lifecycle::LifecycleEvent;
use waypoint_core::Navigator;

/// Drains a navigator's lifecycle broadcast stream into assertable entries.
///
/// Subscribe *before* navigating: broadcast receivers only see events sent
/// after subscription.
pub struct LifecycleRecorder {
    receiver: Mutex<Receiver<LifecycleEvent>>,
}

impl LifecycleRecorder {
    /// Wraps an already obtained receiver.
    pub fn new(receiver: Receiver<LifecycleEvent>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
        }
    }

    /// Subscribes to `navigator`'s stream.
    pub fn attach(navigator: &Navigator) -> Self {
        Self::new(navigator.lifecycle_events())
    }

    /// All events observed since the last drain.
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        let mut receiver = self.receiver.lock();
        let mut events = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Compact `Kind(Screen)` labels of the drained events.
    pub fn labels(&self) -> Vec<String> {
        self.drain().iter().map(LifecycleEvent::label).collect()
    }
}
