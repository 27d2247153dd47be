//! # Waypoint
//!
//! A navigation reconciliation layer between a declarative UI component
//! tree and an imperative, tab/drawer-structured host navigation surface
//! (items → sections → contents, each section owning a page stack).
//!
//! Call sites express *where the user should be* as data — an absolute path
//! of screens, or a relative push/pop against the current position — and
//! the [`Navigator`] computes and applies the minimal structural changes to
//! the host, runs page lifecycle hooks in a well-defined order, and gives
//! every page an isolated scope for its dependencies.
//!
//! ```ignore
//! let navigator = Navigator::builder()
//!     .host(shell.clone())
//!     .register::<HomePage>(|_| Arc::new(HomePage::default()))
//!     .register::<DetailPage>(|_| Arc::new(DetailPage::default()))
//!     .root::<HomePage>()
//!     .build()?;
//! shell.bind(navigator.materializer(), navigator.structure_events());
//! navigator.initialize().await?;
//!
//! navigator.go_to(Navigation::relative().push::<DetailPage>()).await?;
//! navigator.go_to(Navigation::relative().pop()).await?;
//! ```
//!
//! Rendering, dependency-injection internals and platform wiring stay
//! outside: the engine talks to them through the [`shell::ShellSurface`],
//! [`registry::PageMaterializer`] and [`scope::ScopeProvider`] seams.
//!
//! All operations run on a single UI-affine execution context; lifecycle
//! hooks are the only suspension points, and navigations are serialized so
//! at most one is ever in flight.

pub mod context;
pub mod errors;
pub mod intent;
pub mod lifecycle;
pub mod navigator;
pub mod page;
pub mod registry;
pub mod request;
pub mod scope;
pub mod shell;

pub use context::{PageContextRegistry, PageNavigationContext};
pub use errors::NavigationError;
pub use intent::{IntentSink, NavigationIntent, PropsCell};
pub use lifecycle::{LifecycleEvent, LifecycleEventKind, LifecycleHandling};
pub use navigator::{
    BackDisposition, HostNavigationSource, NavigationOutcome, Navigator, NavigatorBuilder,
};
pub use page::{
    AppearingAware, DisappearingAware, EnteringAware, HookResult, LeavingAware, LeavingGuard,
    PageComponent, PageHandle, Screen, ScreenType,
};
pub use registry::{MaterializedPage, PageFactory, PageMaterializer};
pub use request::{
    Navigation, NavigationBehavior, NavigationRequest, NavigationSegment, ScreenSegment,
};
pub use scope::{
    NavigationScope, NavigationScopeProvider, ScopeProvider, ScopedService, ServiceScope,
    ServiceScopeExt,
};
pub use shell::{
    ContentRef, HostError, NavigationStackPage, PageSlot, SectionRef, ShellContentDescriptor,
    ShellItemDescriptor, ShellSectionDescriptor, ShellStructureEvents, ShellSurface,
};

/// Commonly used items, importable in one line.
pub mod prelude {
    pub use crate::errors::NavigationError;
    pub use crate::intent::{IntentSink, NavigationIntent, PropsCell};
    pub use crate::navigator::{NavigationOutcome, Navigator};
    pub use crate::page::{
        AppearingAware, DisappearingAware, EnteringAware, HookResult, LeavingAware, LeavingGuard,
        PageComponent, PageHandle, Screen,
    };
    pub use crate::request::{Navigation, NavigationBehavior, NavigationRequest};
    pub use crate::scope::{ScopedService, ServiceScope, ServiceScopeExt};
}
