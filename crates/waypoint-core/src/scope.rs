//! # Scoped Services
//!
//! Every page materialized through the navigator owns an isolated service
//! scope. Scopes resolve by type: first among their own services, then up an
//! explicit parent chain. Disposing a scope cascades to every service that
//! opted into the disposal capability.
//!
//! The [`ServiceScope`]/[`ScopeProvider`] traits are the seam towards a real
//! dependency-injection container; [`NavigationScope`] is the stock
//! dictionary-backed implementation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// A service whose lifetime is bound to one navigation scope.
///
/// `on_disposed` is the disposal capability; the default implementation does
/// nothing.
pub trait ScopedService: Any + Send + Sync {
    /// Called exactly once when the owning scope is disposed.
    fn on_disposed(&self) {}
}

/// An isolated set of service instances bound to one page.
pub trait ServiceScope: Send + Sync {
    /// Registers a service under the given type id, replacing any previous
    /// registration for that id.
    fn register(&self, ty: TypeId, service: Arc<dyn ScopedService>);

    /// Resolves a service: local registrations first, then the parent chain.
    /// Returns `None` on a disposed scope.
    fn resolve(&self, ty: TypeId) -> Option<Arc<dyn ScopedService>>;

    /// Disposes the scope, cascading to every registered service.
    /// Re-entrant disposal is a no-op.
    fn dispose(&self);

    /// Whether the scope has been disposed.
    fn is_disposed(&self) -> bool;
}

/// Typed convenience over the type-erased [`ServiceScope`] operations.
pub trait ServiceScopeExt {
    /// Registers a service under its own type.
    fn add_scoped<T: ScopedService>(&self, service: Arc<T>);

    /// Resolves a service by type.
    fn get<T: ScopedService>(&self) -> Option<Arc<T>>;
}

impl<S: ServiceScope + ?Sized> ServiceScopeExt for S {
    fn add_scoped<T: ScopedService>(&self, service: Arc<T>) {
        self.register(TypeId::of::<T>(), service);
    }

    fn get<T: ScopedService>(&self) -> Option<Arc<T>> {
        self.resolve(TypeId::of::<T>()).and_then(|service| {
            let any: Arc<dyn Any + Send + Sync> = service;
            any.downcast::<T>().ok()
        })
    }
}

/// Creates scopes chained to a parent provider.
pub trait ScopeProvider: Send + Sync {
    /// Creates a fresh scope whose resolution falls back to `parent`.
    fn create_scope(&self, parent: Option<Arc<dyn ServiceScope>>) -> Arc<dyn ServiceScope>;
}

/// Stock [`ServiceScope`]: a type-keyed map with an explicit parent pointer.
pub struct NavigationScope {
    services: Mutex<HashMap<TypeId, Arc<dyn ScopedService>>>,
    parent: Option<Arc<dyn ServiceScope>>,
    disposed: AtomicBool,
}

impl NavigationScope {
    /// Creates a scope chained to an optional parent.
    pub fn new(parent: Option<Arc<dyn ServiceScope>>) -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
            parent,
            disposed: AtomicBool::new(false),
        }
    }
}

impl ServiceScope for NavigationScope {
    fn register(&self, ty: TypeId, service: Arc<dyn ScopedService>) {
        if self.is_disposed() {
            debug!("ignoring registration on a disposed scope");
            return;
        }
        self.services.lock().insert(ty, service);
    }

    fn resolve(&self, ty: TypeId) -> Option<Arc<dyn ScopedService>> {
        if self.is_disposed() {
            return None;
        }
        if let Some(service) = self.services.lock().get(&ty) {
            return Some(service.clone());
        }
        self.parent.as_ref().and_then(|p| p.resolve(ty))
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let services: Vec<_> = self.services.lock().drain().map(|(_, s)| s).collect();
        for service in services {
            service.on_disposed();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Drop for NavigationScope {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Stock [`ScopeProvider`] producing [`NavigationScope`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavigationScopeProvider;

impl ScopeProvider for NavigationScopeProvider {
    fn create_scope(&self, parent: Option<Arc<dyn ServiceScope>>) -> Arc<dyn ServiceScope> {
        Arc::new(NavigationScope::new(parent))
    }
}
