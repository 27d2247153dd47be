//! # Page Components
//!
//! Pages are opaque component instances produced by the rendering
//! collaborator. The navigator never looks inside a page; it only probes it
//! for the lifecycle capabilities below and drives them around transitions.
//!
//! Capability probes return `Option<&dyn ...>` with a `None` default, so a
//! page opts into exactly the hooks it cares about.

use std::any::TypeId;
use std::sync::Arc;

use async_trait::async_trait;

use crate::intent::IntentSink;

/// Result type for asynchronous lifecycle hooks.
///
/// Hook failures propagate to the caller of [`Navigator::go_to`] wrapped in
/// [`NavigationError::Lifecycle`]; structural changes already applied are not
/// rolled back.
///
/// [`Navigator::go_to`]: crate::navigator::Navigator::go_to
/// [`NavigationError::Lifecycle`]: crate::errors::NavigationError::Lifecycle
pub type HookResult = anyhow::Result<()>;

/// Marker trait for types addressable as navigation targets.
///
/// The default segment name is the short type name (module path and generic
/// arguments stripped); override [`Screen::segment`] for custom routes.
pub trait Screen: 'static {
    /// Route segment used for this screen in navigation paths.
    fn segment() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Identity of a screen type: `TypeId` plus diagnostic name plus route segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenType {
    id: TypeId,
    name: &'static str,
    segment: &'static str,
}

impl ScreenType {
    /// Identity of the screen type `T`.
    pub fn of<T: Screen>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
            segment: T::segment(),
        }
    }

    /// Short type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Default route segment for this screen.
    pub fn segment(&self) -> &'static str {
        self.segment
    }
}

/// Strips generic arguments and the module path from a type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Invoked when the page is pushed onto the navigation stack.
///
/// Long operations here make the navigation feel slow; prefer kicking off
/// background work and completing quickly.
#[async_trait]
pub trait EnteringAware: Send + Sync {
    /// Called once per visit, before the page first appears.
    async fn on_entering(&self) -> HookResult;
}

/// Invoked when the page becomes the visible page.
#[async_trait]
pub trait AppearingAware: Send + Sync {
    /// Called when the page is appearing.
    async fn on_appearing(&self) -> HookResult;
}

/// Invoked when the page is removed from the navigation stack.
#[async_trait]
pub trait LeavingAware: Send + Sync {
    /// Called once per departure, after the page has disappeared.
    async fn on_leaving(&self) -> HookResult;
}

/// Invoked when the page stops being the visible page.
#[async_trait]
pub trait DisappearingAware: Send + Sync {
    /// Called when the page is disappearing.
    async fn on_disappearing(&self) -> HookResult;
}

/// Asynchronous veto over the page's removal from the stack.
///
/// Consulted on every leave attempt, before any mutation; a page without
/// this capability may always leave.
#[async_trait]
pub trait LeavingGuard: Send + Sync {
    /// Returns false to decline the navigation that would remove this page.
    async fn can_leave(&self) -> bool;
}

/// An opaque page component instance.
///
/// The provided methods are capability probes; override the ones the page
/// implements.
pub trait PageComponent: Send + Sync + 'static {
    /// Entering capability, if implemented.
    fn entering(&self) -> Option<&dyn EnteringAware> {
        None
    }

    /// Appearing capability, if implemented.
    fn appearing(&self) -> Option<&dyn AppearingAware> {
        None
    }

    /// Leaving capability, if implemented.
    fn leaving(&self) -> Option<&dyn LeavingAware> {
        None
    }

    /// Disappearing capability, if implemented.
    fn disappearing(&self) -> Option<&dyn DisappearingAware> {
        None
    }

    /// Leaving guard, if implemented.
    fn leaving_guard(&self) -> Option<&dyn LeavingGuard> {
        None
    }

    /// Writable property holder, if the page accepts navigation intents.
    fn intent_sink(&self) -> Option<&dyn IntentSink> {
        None
    }
}

/// Shared handle to a page component.
pub type PageHandle = Arc<dyn PageComponent>;
