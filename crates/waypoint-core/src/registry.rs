//! # Screen Registry & Route Factories
//!
//! Screens are registered with a factory closure that builds the page
//! component inside its freshly created scope. When the engine decides to
//! show a screen it builds the page *first* and enqueues it, together with
//! any staged intent, into a per-screen FIFO; the host's materialization
//! callback then dequeues exactly one entry. Keeping the queue and the
//! host's callbacks in 1:1 correspondence is what guarantees a pushed host
//! page gets the component the engine intended for it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::context::PageNavigationContext;
use crate::errors::NavigationError;
use crate::intent::NavigationIntent;
use crate::page::{PageHandle, ScreenType};
use crate::scope::ServiceScope;

/// Builds a page component inside its navigation scope.
pub type PageFactory = Arc<dyn Fn(&Arc<dyn ServiceScope>) -> PageHandle + Send + Sync>;

/// One enqueued materialization: the prebuilt page and its staged intent.
pub(crate) struct QueuedPage {
    pub(crate) context: Arc<PageNavigationContext>,
    pub(crate) intent: Option<NavigationIntent>,
}

/// Screen factories plus the pending-materialization queues.
#[derive(Default)]
pub(crate) struct ScreenRegistry {
    factories: RwLock<HashMap<ScreenType, PageFactory>>,
    queues: Mutex<HashMap<ScreenType, VecDeque<QueuedPage>>>,
}

impl ScreenRegistry {
    pub(crate) fn register(&self, screen: ScreenType, factory: PageFactory) {
        self.factories.write().insert(screen, factory);
    }

    pub(crate) fn factory(&self, screen: ScreenType) -> Option<PageFactory> {
        self.factories.read().get(&screen).cloned()
    }

    pub(crate) fn enqueue(&self, screen: ScreenType, queued: QueuedPage) {
        self.queues.lock().entry(screen).or_default().push_back(queued);
    }

    pub(crate) fn dequeue(&self, screen: ScreenType) -> Option<QueuedPage> {
        self.queues
            .lock()
            .get_mut(&screen)
            .and_then(VecDeque::pop_front)
    }
}

/// A page handed to the host for one materialization request.
pub struct MaterializedPage {
    /// The component instance the engine intended for this slot.
    pub component: PageHandle,
    /// The staged intent, exposed so hosts can render initial props
    /// immediately; delivery to the page still happens exactly once,
    /// before its Appearing event.
    pub intent: Option<NavigationIntent>,
}

/// Engine-side materialization callback handed to the host surface.
///
/// Each call dequeues exactly one pending page for `screen`.
pub trait PageMaterializer: Send + Sync {
    /// The next pending page for `screen`.
    ///
    /// Fails with [`NavigationError::UnexpectedMaterialization`] when the
    /// engine never enqueued one — a desync that would otherwise produce a
    /// page with the wrong identity.
    fn materialize(&self, screen: ScreenType) -> Result<MaterializedPage, NavigationError>;
}
