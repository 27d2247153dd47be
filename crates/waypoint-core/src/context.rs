//! # Page Navigation Contexts
//!
//! A [`PageNavigationContext`] is created the first time a page is
//! materialized through the navigator and destroyed when the page is
//! permanently removed from the surface. It owns the page's service scope
//! (disposal cascades to the scope) and carries the two lifecycle flags the
//! dispatcher keys on.
//!
//! The registry holds the strong reference to each page component; host
//! surfaces are expected to keep only weak associations, so destroying a
//! context is what actually ends a page's life.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::NavigationError;
use crate::intent::NavigationIntent;
use crate::page::{PageHandle, ScreenType};
use crate::scope::ServiceScope;

/// Per-page navigation state: scope ownership plus lifecycle flags.
pub struct PageNavigationContext {
    page: PageHandle,
    screen: ScreenType,
    scope: Arc<dyn ServiceScope>,
    entered: AtomicBool,
    appeared: AtomicBool,
    pending_intent: Mutex<Option<NavigationIntent>>,
}

impl PageNavigationContext {
    fn new(page: PageHandle, screen: ScreenType, scope: Arc<dyn ServiceScope>) -> Self {
        Self {
            page,
            screen,
            scope,
            entered: AtomicBool::new(false),
            appeared: AtomicBool::new(false),
            pending_intent: Mutex::new(None),
        }
    }

    /// The page this context belongs to.
    pub fn page(&self) -> &PageHandle {
        &self.page
    }

    /// The screen type the page was materialized for.
    pub fn screen(&self) -> ScreenType {
        self.screen
    }

    /// The page's service scope.
    pub fn scope(&self) -> &Arc<dyn ServiceScope> {
        &self.scope
    }

    /// Whether the page is currently entered.
    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }

    /// Whether the page is currently appeared.
    pub fn appeared(&self) -> bool {
        self.appeared.load(Ordering::Acquire)
    }

    pub(crate) fn set_entered(&self, value: bool) {
        self.entered.store(value, Ordering::Release);
    }

    pub(crate) fn set_appeared(&self, value: bool) {
        self.appeared.store(value, Ordering::Release);
    }

    /// Stages a one-shot intent to be consumed before the next Appearing.
    pub(crate) fn set_pending_intent(&self, intent: Option<NavigationIntent>) {
        *self.pending_intent.lock() = intent;
    }

    pub(crate) fn take_pending_intent(&self) -> Option<NavigationIntent> {
        self.pending_intent.lock().take()
    }
}

/// Associates page instances with their navigation contexts.
///
/// Keys are the page's `Arc` data pointer: identity, not equality.
#[derive(Default)]
pub struct PageContextRegistry {
    contexts: Mutex<HashMap<usize, Arc<PageNavigationContext>>>,
}

impl PageContextRegistry {
    fn key(page: &PageHandle) -> usize {
        Arc::as_ptr(page) as *const () as usize
    }

    /// Creates and stores the context for a freshly materialized page.
    pub fn create(
        &self,
        page: PageHandle,
        screen: ScreenType,
        scope: Arc<dyn ServiceScope>,
    ) -> Arc<PageNavigationContext> {
        let context = Arc::new(PageNavigationContext::new(page.clone(), screen, scope));
        self.contexts.lock().insert(Self::key(&page), context.clone());
        context
    }

    /// The context of a page created through the navigator.
    ///
    /// A page created by any other means has no context and cannot
    /// participate in navigation.
    pub fn get(&self, page: &PageHandle) -> Result<Arc<PageNavigationContext>, NavigationError> {
        self.contexts
            .lock()
            .get(&Self::key(page))
            .cloned()
            .ok_or(NavigationError::MissingContext)
    }

    /// Destroys a page's context: disposes its scope and drops the strong
    /// page reference. A second destroy for the same page is a no-op.
    pub fn destroy(&self, page: &PageHandle) {
        if let Some(context) = self.contexts.lock().remove(&Self::key(page)) {
            context.scope.dispose();
        }
    }

    /// Number of pages with a live navigation context.
    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Whether no page currently has a context.
    pub fn is_empty(&self) -> bool {
        self.contexts.lock().is_empty()
    }
}
