//! # Lifecycle Dispatch
//!
//! Four one-shot-per-visit events guarded by the context flags, plus the
//! non-idempotent leaving guard. Every dispatch — handled by a capability or
//! not — emits a [`LifecycleEvent`] on a broadcast stream for diagnostics
//! and tooling; the stream is not required for navigation correctness.

use std::fmt;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::context::PageNavigationContext;
use crate::errors::NavigationError;
use crate::intent::NavigationIntent;
use crate::page::{PageHandle, ScreenType};

/// Capacity of the lifecycle broadcast channel. Slow diagnostic consumers
/// lag rather than block navigation.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The kind of a lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    /// The page joined the navigation stack.
    Entering,
    /// The page became the visible page.
    Appearing,
    /// The page left the navigation stack.
    Leaving,
    /// The page stopped being the visible page.
    Disappearing,
    /// The page's leaving guard was consulted.
    LeavingGuard,
}

/// Whether a capability handled the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleHandling {
    /// The page implements the capability and it was invoked.
    Handled,
    /// The page does not implement the capability.
    NotHandled,
    /// A navigation intent was delivered to the page's property holder.
    HandledWithIntent,
}

/// One observable lifecycle notification.
#[derive(Clone)]
pub struct LifecycleEvent {
    /// The event kind.
    pub kind: LifecycleEventKind,
    /// The screen type of the page involved.
    pub screen: ScreenType,
    /// The page instance involved.
    pub component: PageHandle,
    /// How the page handled the event.
    pub handling: LifecycleHandling,
    /// The delivered intent, for [`LifecycleHandling::HandledWithIntent`].
    pub intent: Option<NavigationIntent>,
}

impl LifecycleEvent {
    /// Compact `Kind(Screen)` label, convenient for assertions and logs.
    pub fn label(&self) -> String {
        format!("{:?}({})", self.kind, self.screen.name())
    }
}

impl fmt::Debug for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleEvent")
            .field("kind", &self.kind)
            .field("screen", &self.screen.name())
            .field("handling", &self.handling)
            .field("intent", &self.intent.is_some())
            .finish()
    }
}

/// Sequences lifecycle events around page transitions.
pub(crate) struct LifecycleDispatcher {
    events: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleDispatcher {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { events }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    fn emit(
        &self,
        kind: LifecycleEventKind,
        context: &PageNavigationContext,
        handling: LifecycleHandling,
        intent: Option<NavigationIntent>,
    ) {
        // Nobody listening is fine; the stream is diagnostics only.
        let _ = self.events.send(LifecycleEvent {
            kind,
            screen: context.screen(),
            component: context.page().clone(),
            handling,
            intent,
        });
    }

    /// Dispatches Entering: no-op if the page is already entered.
    pub(crate) async fn send_entering(
        &self,
        context: &PageNavigationContext,
    ) -> Result<(), NavigationError> {
        if context.entered() {
            return Ok(());
        }
        context.set_entered(true);

        let page = context.page().clone();
        if let Some(capability) = page.entering() {
            debug!(page = context.screen().name(), "entering");
            self.emit(LifecycleEventKind::Entering, context, LifecycleHandling::Handled, None);
            capability
                .on_entering()
                .await
                .map_err(|source| NavigationError::Lifecycle {
                    page: context.screen().name(),
                    source,
                })?;
        } else {
            self.emit(LifecycleEventKind::Entering, context, LifecycleHandling::NotHandled, None);
        }
        Ok(())
    }

    /// Dispatches Appearing: no-op if the page is already appeared. A staged
    /// intent is delivered to the page's property holder first.
    pub(crate) async fn send_appearing(
        &self,
        context: &PageNavigationContext,
    ) -> Result<(), NavigationError> {
        if context.appeared() {
            return Ok(());
        }
        context.set_appeared(true);

        let page = context.page().clone();
        if let Some(intent) = context.take_pending_intent() {
            if let Some(sink) = page.intent_sink() {
                debug!(page = context.screen().name(), "appearing with navigation intent");
                self.emit(
                    LifecycleEventKind::Appearing,
                    context,
                    LifecycleHandling::HandledWithIntent,
                    Some(intent.clone()),
                );
                if !sink.apply(intent.payload()) {
                    warn!(
                        page = context.screen().name(),
                        "navigation intent type does not match the page's property holder"
                    );
                }
            } else {
                debug!(
                    page = context.screen().name(),
                    "dropping navigation intent: page has no property holder"
                );
            }
        }

        if let Some(capability) = page.appearing() {
            debug!(page = context.screen().name(), "appearing");
            self.emit(LifecycleEventKind::Appearing, context, LifecycleHandling::Handled, None);
            capability
                .on_appearing()
                .await
                .map_err(|source| NavigationError::Lifecycle {
                    page: context.screen().name(),
                    source,
                })?;
        } else {
            self.emit(LifecycleEventKind::Appearing, context, LifecycleHandling::NotHandled, None);
        }
        Ok(())
    }

    /// Dispatches Leaving: no-op unless the page is entered.
    pub(crate) async fn send_leaving(
        &self,
        context: &PageNavigationContext,
    ) -> Result<(), NavigationError> {
        if !context.entered() {
            return Ok(());
        }
        context.set_entered(false);

        let page = context.page().clone();
        if let Some(capability) = page.leaving() {
            debug!(page = context.screen().name(), "leaving");
            self.emit(LifecycleEventKind::Leaving, context, LifecycleHandling::Handled, None);
            capability
                .on_leaving()
                .await
                .map_err(|source| NavigationError::Lifecycle {
                    page: context.screen().name(),
                    source,
                })?;
        } else {
            self.emit(LifecycleEventKind::Leaving, context, LifecycleHandling::NotHandled, None);
        }
        Ok(())
    }

    /// Dispatches Disappearing: no-op unless the page is appeared.
    pub(crate) async fn send_disappearing(
        &self,
        context: &PageNavigationContext,
    ) -> Result<(), NavigationError> {
        if !context.appeared() {
            return Ok(());
        }
        context.set_appeared(false);

        let page = context.page().clone();
        if let Some(capability) = page.disappearing() {
            debug!(page = context.screen().name(), "disappearing");
            self.emit(
                LifecycleEventKind::Disappearing,
                context,
                LifecycleHandling::Handled,
                None,
            );
            capability
                .on_disappearing()
                .await
                .map_err(|source| NavigationError::Lifecycle {
                    page: context.screen().name(),
                    source,
                })?;
        } else {
            self.emit(
                LifecycleEventKind::Disappearing,
                context,
                LifecycleHandling::NotHandled,
                None,
            );
        }
        Ok(())
    }

    /// Consults the leaving guard. Unlike the four events above this is not
    /// flag-guarded: it runs on every leave attempt. A page without the
    /// capability may always leave, and no event is emitted for it.
    pub(crate) async fn can_leave(&self, context: &PageNavigationContext) -> bool {
        let page = context.page().clone();
        if let Some(guard) = page.leaving_guard() {
            debug!(page = context.screen().name(), "consulting leaving guard");
            self.emit(
                LifecycleEventKind::LeavingGuard,
                context,
                LifecycleHandling::Handled,
                None,
            );
            guard.can_leave().await
        } else {
            true
        }
    }
}
