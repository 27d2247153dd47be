//! # Navigator
//!
//! The reconciliation engine. A navigation call runs through six phases,
//! strictly in this order and strictly one call at a time:
//!
//! 1. **Resolve** the request into a target content plus target page
//!    segments (relative requests compose against the current stack).
//! 2. **Guard**: every page the transition would remove is asked, topmost
//!    first; any refusal aborts with no side effects.
//! 3. **Leave**: removed pages get Disappearing then Leaving, topmost first.
//! 4. **Structural**: switch content if needed, trim the removed stack
//!    suffix, stage and push the added pages through the route-factory
//!    queues.
//! 5. **Enter**: newly present pages get Entering then Appearing, bottom
//!    first; the final target's intent is delivered before its Appearing.
//! 6. **Commit**: release the serialization gate; a queued navigation
//!    starts over at phase 1.
//!
//! Lifecycle hooks may suspend; nothing proceeds past a suspension point
//! until it completes, and a hook that never resolves stalls all further
//! navigation — that risk is surfaced to the application, not handled here.

use std::sync::{Arc, Weak};

use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::context::{PageContextRegistry, PageNavigationContext};
use crate::errors::NavigationError;
use crate::intent::NavigationIntent;
use crate::lifecycle::{LifecycleDispatcher, LifecycleEvent};
use crate::page::{PageComponent, PageHandle, Screen, ScreenType};
use crate::registry::{
    MaterializedPage, PageFactory, PageMaterializer, QueuedPage, ScreenRegistry,
};
use crate::request::{
    Navigation, NavigationBehavior, NavigationRequest, NavigationSegment, ScreenSegment,
};
use crate::scope::{NavigationScopeProvider, ScopeProvider, ServiceScope};
use crate::shell::{
    NavigationStackPage, ShellContentProxy, ShellProxy, ShellStructureEvents, ShellSurface,
};

/// How a navigation finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The surface now reflects the requested position.
    Completed,
    /// A leaving guard declined; nothing was mutated.
    Declined,
}

/// What the engine did with a hardware back press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackDisposition {
    /// The engine consumed the press (a pop was dispatched, or declined by
    /// a guard).
    Handled,
    /// The stack is at its root; let the platform handle the press.
    Unhandled,
}

/// The host-side origin of an intercepted navigation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostNavigationSource {
    /// The host is pushing a page.
    Push,
    /// The host is popping a page (e.g. a back gesture).
    Pop,
    /// The host is removing pages from the middle or top of a stack.
    Remove,
    /// The user selected a content from the host chrome (tab bar, flyout).
    SwitchContent,
}

/// A page the transition should end up with.
struct TargetPage {
    segment: String,
    /// `None` for pages kept from the current stack (nothing to
    /// materialize); `Some` for pages the request names.
    screen: Option<ScreenType>,
}

struct NavigatorInner {
    host: Arc<dyn ShellSurface>,
    proxy: Arc<ShellProxy>,
    registry: ScreenRegistry,
    contexts: PageContextRegistry,
    dispatcher: LifecycleDispatcher,
    scope_provider: Arc<dyn ScopeProvider>,
    parent_services: Option<Arc<dyn ServiceScope>>,
    root: Option<ScreenType>,
    /// The at-most-one-navigation-in-flight gate. Tokio's mutex queues
    /// waiters FIFO, which is exactly the submission-order guarantee.
    gate: Mutex<()>,
}

/// Configures and builds a [`Navigator`].
pub struct NavigatorBuilder {
    host: Option<Arc<dyn ShellSurface>>,
    scope_provider: Arc<dyn ScopeProvider>,
    parent_services: Option<Arc<dyn ServiceScope>>,
    screens: Vec<(ScreenType, PageFactory)>,
    root: Option<ScreenType>,
}

impl NavigatorBuilder {
    /// The host surface to drive. Required.
    pub fn host(mut self, host: Arc<dyn ShellSurface>) -> Self {
        self.host = Some(host);
        self
    }

    /// Registers screen `T` with the factory that builds its page component
    /// inside a fresh navigation scope.
    pub fn register<T, F>(mut self, factory: F) -> Self
    where
        T: Screen + PageComponent,
        F: Fn(&Arc<dyn ServiceScope>) -> Arc<T> + Send + Sync + 'static,
    {
        self.screens.push((
            ScreenType::of::<T>(),
            Arc::new(move |scope: &Arc<dyn ServiceScope>| -> PageHandle { factory(scope) }),
        ));
        self
    }

    /// Records screen `T` as the startup root for [`Navigator::initialize`].
    /// `T` must also be registered.
    pub fn root<T: Screen>(mut self) -> Self {
        self.root = Some(ScreenType::of::<T>());
        self
    }

    /// Replaces the stock scope provider with a real container adapter.
    pub fn scope_provider(mut self, provider: Arc<dyn ScopeProvider>) -> Self {
        self.scope_provider = provider;
        self
    }

    /// Application-level services page scopes fall back to.
    pub fn parent_services(mut self, services: Arc<dyn ServiceScope>) -> Self {
        self.parent_services = Some(services);
        self
    }

    /// Builds the navigator, observing the host structure immediately.
    pub fn build(self) -> Result<Navigator, NavigationError> {
        let host = self
            .host
            .ok_or(NavigationError::Configuration("a host surface is required"))?;
        let proxy = ShellProxy::new(host.clone());
        let registry = ScreenRegistry::default();
        for (screen, factory) in self.screens {
            registry.register(screen, factory);
        }
        Ok(Navigator {
            inner: Arc::new(NavigatorInner {
                host,
                proxy,
                registry,
                contexts: PageContextRegistry::default(),
                dispatcher: LifecycleDispatcher::new(),
                scope_provider: self.scope_provider,
                parent_services: self.parent_services,
                root: self.root,
                gate: Mutex::new(()),
            }),
        })
    }
}

/// The navigation service: accepts requests, reconciles them against the
/// host surface, and runs page lifecycles around each transition.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

impl Navigator {
    /// Starts configuring a navigator.
    pub fn builder() -> NavigatorBuilder {
        NavigatorBuilder {
            host: None,
            scope_provider: Arc::new(NavigationScopeProvider),
            parent_services: None,
            screens: Vec::new(),
            root: None,
        }
    }

    /// The materialization callback to bind into the host surface.
    pub fn materializer(&self) -> Arc<dyn PageMaterializer> {
        Arc::new(MaterializerHandle {
            inner: Arc::downgrade(&self.inner),
        })
    }

    /// The structural-change listener to bind into the host surface.
    pub fn structure_events(&self) -> Arc<dyn ShellStructureEvents> {
        Arc::new(StructureEventsHandle {
            proxy: Arc::downgrade(&self.inner.proxy),
        })
    }

    /// Subscribes to the lifecycle notification stream.
    pub fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.dispatcher.subscribe()
    }

    /// Number of pages currently owning a navigation context (and scope).
    /// Useful for leak diagnostics in tests and tooling.
    pub fn live_page_count(&self) -> usize {
        self.inner.contexts.len()
    }

    /// Canonical `//content/page…` path of the current logical stack.
    pub fn current_path(&self) -> String {
        let Some(section) = self.inner.proxy.current_section() else {
            return "//".to_owned();
        };
        if let Some(last) = section.get_navigation_stack(None).last() {
            return last.route.clone();
        }
        match section.current_content() {
            Some(content) => format!("//{}", content.segment()),
            None => "//".to_owned(),
        }
    }

    /// The current logical navigation stack.
    pub fn navigation_stack(&self) -> Vec<NavigationStackPage> {
        self.inner
            .proxy
            .current_section()
            .map(|s| s.get_navigation_stack(None))
            .unwrap_or_default()
    }

    /// Navigates to the configured root screen. Call once the host surface
    /// is attached and its structure is observable.
    pub async fn initialize(&self) -> Result<NavigationOutcome, NavigationError> {
        let root = self
            .inner
            .root
            .ok_or(NavigationError::Configuration("no root screen configured"))?;
        let request = NavigationRequest::absolute_from_segments(
            vec![ScreenSegment {
                screen: root,
                segment: root.segment().to_owned(),
            }],
            NavigationBehavior::default(),
        )?;
        self.go_to(request).await
    }

    /// Performs a navigation.
    ///
    /// Requests are processed strictly one at a time in submission order; a
    /// request submitted while another is in flight queues behind it and is
    /// never interleaved or speculatively started.
    pub async fn go_to(
        &self,
        request: impl Into<NavigationRequest>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let request = request.into();
        let _in_flight = self.inner.gate.lock().await;
        debug!(path = %request.path(), absolute = request.is_absolute(), "navigation started");
        let outcome = self.execute(&request).await?;
        match outcome {
            NavigationOutcome::Completed => debug!(path = %request.path(), "navigation completed"),
            NavigationOutcome::Declined => debug!(path = %request.path(), "navigation declined"),
        }
        Ok(outcome)
    }

    /// Handles a hardware back press: pops above the root, defers to the
    /// platform at the root.
    pub async fn handle_back(&self) -> Result<BackDisposition, NavigationError> {
        let depth = self
            .inner
            .proxy
            .current_section()
            .map(|s| s.get_navigation_stack(None).len())
            .unwrap_or(0);
        if depth > 1 {
            self.go_to(Navigation::relative().pop()).await?;
            Ok(BackDisposition::Handled)
        } else {
            Ok(BackDisposition::Unhandled)
        }
    }

    /// Decides what to do with a navigation the host initiated on its own
    /// (tab tap, back gesture, platform stack pruning).
    ///
    /// Returns `None` when the event is the engine's own cleanup echoing
    /// back (a removal of pages this engine marked, or of a content whose
    /// page it already destroyed) and the host should let it proceed.
    /// Otherwise returns the request the host should dispatch through
    /// [`Navigator::go_to`] *instead of* performing its own navigation.
    pub fn resolve_host_navigation(
        &self,
        source: HostNavigationSource,
        segments: &[&str],
    ) -> Result<Option<NavigationRequest>, NavigationError> {
        // An empty target is the platform backgrounding the app.
        if segments.is_empty() {
            return Ok(None);
        }
        if segments.len() == 1 && segments[0] == ".." {
            return Ok(Some(Navigation::relative().pop().into()));
        }

        let (content, _consumed) = self.inner.proxy.find_content(segments)?;
        let section = content
            .parent()
            .ok_or(NavigationError::Configuration("target content is detached from its section"))?;

        if matches!(source, HostNavigationSource::Remove)
            && (!content.has_page() || section.has_pages_marked_for_removal())
        {
            debug!(content = content.segment(), "letting engine-initiated stack cleanup proceed");
            return Ok(None);
        }

        // Compose an absolute request for the tapped content; when it owns
        // the live stack the pushed pages come along.
        let mut screens = vec![ScreenSegment {
            screen: content.screen(),
            segment: content.segment().to_owned(),
        }];
        let owns_stack = section
            .current_content()
            .is_some_and(|current| current.content_ref() == content.content_ref());
        if owns_stack {
            for page in section.get_navigation_stack(Some(&content)).into_iter().skip(1) {
                let context = self.inner.contexts.get(&page.component)?;
                screens.push(ScreenSegment {
                    screen: context.screen(),
                    segment: page.segment,
                });
            }
        }
        NavigationRequest::absolute_from_segments(screens, NavigationBehavior::default()).map(Some)
    }

    async fn execute(
        &self,
        request: &NavigationRequest,
    ) -> Result<NavigationOutcome, NavigationError> {
        let inner = &*self.inner;

        // Phase 1: resolve current and target positions.
        let current_section = inner.proxy.current_section();
        let current_content = current_section.as_ref().and_then(|s| s.current_content());
        let current_stack = current_section
            .as_ref()
            .map(|s| s.get_navigation_stack(None))
            .unwrap_or_default();

        let (target_content, target_pages) =
            self.resolve_target(request, current_content.as_ref(), &current_stack)?;

        let content_changes = match current_content.as_ref() {
            Some(current) => current.content_ref() != target_content.content_ref(),
            None => true,
        };
        let root_missing = current_stack.is_empty();
        let current_pages: &[NavigationStackPage] = if current_stack.is_empty() {
            &[]
        } else {
            &current_stack[1..]
        };

        // Pages removed by the transition, topmost first. A content switch
        // removes the whole departed stack, root included.
        let (kept, removed) = if content_changes {
            let mut removed: Vec<_> = current_pages.iter().rev().cloned().collect();
            removed.extend(current_stack.first().cloned());
            (0, removed)
        } else {
            let kept = current_pages
                .iter()
                .zip(target_pages.iter())
                .take_while(|(current, target)| current.segment == target.segment)
                .count();
            (kept, current_pages[kept..].iter().rev().cloned().collect())
        };

        // Phase 2: guards. Nothing has been mutated yet, so a refusal
        // aborts atomically.
        if !request.behavior().ignore_guards {
            for page in &removed {
                let context = inner.contexts.get(&page.component)?;
                if !inner.dispatcher.can_leave(&context).await {
                    debug!(
                        path = %request.path(),
                        page = context.screen().name(),
                        "navigation declined by leaving guard"
                    );
                    return Ok(NavigationOutcome::Declined);
                }
            }
        }

        // Phase 3: leave side, topmost first.
        for page in &removed {
            let context = inner.contexts.get(&page.component)?;
            inner.dispatcher.send_disappearing(&context).await?;
            inner.dispatcher.send_leaving(&context).await?;
        }

        // Phase 4: structural changes.
        let target_section = target_content
            .parent()
            .ok_or(NavigationError::Configuration("target content is detached from its section"))?;
        let final_target_is_root = target_pages.is_empty();
        let mut enter_contexts: Vec<Arc<PageNavigationContext>> = Vec::new();

        if content_changes || root_missing {
            let staged_root = if target_content.page().is_none() {
                let intent = final_target_is_root
                    .then(|| request.intent().cloned())
                    .flatten();
                Some(self.create_page(target_content.screen(), intent)?)
            } else {
                None
            };

            if content_changes {
                inner.host.switch_current_content(target_content.content_ref())?;
            }
            inner.host.ensure_content_page(target_content.content_ref())?;

            match staged_root {
                Some(context) => enter_contexts.push(context),
                None => {
                    // Root already materialized by the host: enter it only
                    // if this engine knows it.
                    if let Some(component) =
                        target_content.page().and_then(|slot| slot.component())
                    {
                        if let Ok(context) = inner.contexts.get(&component) {
                            enter_contexts.push(context);
                        }
                    }
                }
            }
        }

        if content_changes {
            // Clean up the departed section after the switch: its pushed
            // pages and content page are permanently removed.
            if let Some(old_section) = current_section.as_ref() {
                old_section.remove_stack_pages(None)?;
            }
            for page in &removed {
                inner.contexts.destroy(&page.component);
            }
            if let Some(old_content) = current_content.as_ref() {
                if old_content.has_page() {
                    old_content.destroy_page()?;
                }
            }
        } else if !removed.is_empty() {
            target_section.remove_stack_pages(Some(removed.len()))?;
            for page in &removed {
                inner.contexts.destroy(&page.component);
            }
        }

        let added = &target_pages[kept..];
        for (index, page) in added.iter().enumerate() {
            let screen = page.screen.ok_or(NavigationError::InvalidRequest(
                "a page to add carries no screen type",
            ))?;
            let is_final = index == added.len() - 1;
            let intent = is_final.then(|| request.intent().cloned()).flatten();
            let context = self.create_page(screen, intent)?;
            enter_contexts.push(context);
            inner.host.push_page(target_section.section_ref(), screen)?;
        }

        // Phase 5: enter side, bottom first.
        for context in &enter_contexts {
            inner.dispatcher.send_entering(context).await?;
            inner.dispatcher.send_appearing(context).await?;
        }

        Ok(NavigationOutcome::Completed)
    }

    fn resolve_target(
        &self,
        request: &NavigationRequest,
        current_content: Option<&Arc<ShellContentProxy>>,
        current_stack: &[NavigationStackPage],
    ) -> Result<(Arc<ShellContentProxy>, Vec<TargetPage>), NavigationError> {
        if request.is_absolute() {
            let screens = request.screen_segments();
            if screens.is_empty() {
                return Err(NavigationError::InvalidRequest(
                    "absolute request has no segments",
                ));
            }
            let names: Vec<&str> = screens.iter().map(|s| s.segment.as_str()).collect();
            let (content, consumed) = self.inner.proxy.find_content(&names)?;
            let pages = screens[consumed..]
                .iter()
                .map(|s| TargetPage {
                    segment: s.segment.clone(),
                    screen: Some(s.screen),
                })
                .collect();
            Ok((content, pages))
        } else {
            let content = current_content
                .cloned()
                .ok_or_else(|| NavigationError::ContentNotFound {
                    path: request.path(),
                })?;
            let mut pages: Vec<TargetPage> = current_stack
                .iter()
                .skip(1)
                .map(|p| TargetPage {
                    segment: p.segment.clone(),
                    screen: None,
                })
                .collect();
            for segment in request.segments() {
                match segment {
                    NavigationSegment::Pop => {
                        if pages.pop().is_none() {
                            return Err(NavigationError::PopPastRoot);
                        }
                    }
                    NavigationSegment::PopAll => pages.clear(),
                    NavigationSegment::Screen(s) => pages.push(TargetPage {
                        segment: s.segment.clone(),
                        screen: Some(s.screen),
                    }),
                }
            }
            Ok((content, pages))
        }
    }

    /// Builds a page in a fresh scope, records its context, and enqueues it
    /// for the host's next materialization of `screen`.
    fn create_page(
        &self,
        screen: ScreenType,
        intent: Option<NavigationIntent>,
    ) -> Result<Arc<PageNavigationContext>, NavigationError> {
        let inner = &*self.inner;
        let factory = inner
            .registry
            .factory(screen)
            .ok_or(NavigationError::UnregisteredScreen {
                screen: screen.name(),
            })?;
        let scope = inner.scope_provider.create_scope(inner.parent_services.clone());
        let page = factory(&scope);
        let context = inner.contexts.create(page, screen, scope);
        debug!(screen = screen.name(), "page staged for materialization");
        inner.registry.enqueue(
            screen,
            QueuedPage {
                context: context.clone(),
                intent,
            },
        );
        Ok(context)
    }
}

struct MaterializerHandle {
    inner: Weak<NavigatorInner>,
}

impl PageMaterializer for MaterializerHandle {
    fn materialize(&self, screen: ScreenType) -> Result<MaterializedPage, NavigationError> {
        let inner = self
            .inner
            .upgrade()
            .ok_or(NavigationError::Configuration("navigator was dropped"))?;
        let queued = inner
            .registry
            .dequeue(screen)
            .ok_or(NavigationError::UnexpectedMaterialization {
                screen: screen.name(),
            })?;
        // Stage the intent for exactly-once delivery before Appearing.
        queued.context.set_pending_intent(queued.intent.clone());
        Ok(MaterializedPage {
            component: queued.context.page().clone(),
            intent: queued.intent,
        })
    }
}

struct StructureEventsHandle {
    proxy: Weak<ShellProxy>,
}

impl ShellStructureEvents for StructureEventsHandle {
    fn items_changed(&self) {
        if let Some(proxy) = self.proxy.upgrade() {
            proxy.items_changed();
        }
    }

    fn current_item_changed(&self) {
        if let Some(proxy) = self.proxy.upgrade() {
            proxy.current_item_changed();
        }
    }

    fn current_content_changed(&self, section: &crate::shell::SectionRef) {
        if let Some(proxy) = self.proxy.upgrade() {
            proxy.current_content_changed(section);
        }
    }
}
