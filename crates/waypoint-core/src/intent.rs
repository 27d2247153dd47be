//! # Navigation Intents
//!
//! A navigation intent is a one-shot, typed payload attached to a request
//! and delivered to the target page immediately before its Appearing event.
//! Intents are values with `PartialEq` rather than callbacks: request
//! matching compares them by dynamic type and value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Object-safe view over an intent payload: `Any` plus dynamic equality.
///
/// Blanket-implemented for every `PartialEq + Send + Sync + 'static` type;
/// application code never implements this directly.
pub trait IntentValue: Any + Send + Sync {
    /// The payload as `Any`, for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// True when `other` has the same dynamic type and compares equal.
    fn dyn_eq(&self, other: &dyn IntentValue) -> bool;
}

impl<T> IntentValue for T
where
    T: Any + Send + Sync + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn IntentValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }
}

/// Type-erased one-shot payload carried by a navigation request.
#[derive(Clone)]
pub struct NavigationIntent {
    value: Arc<dyn IntentValue>,
}

impl NavigationIntent {
    /// Wraps a payload value.
    pub fn new<P>(payload: P) -> Self
    where
        P: Any + Send + Sync + PartialEq,
    {
        Self {
            value: Arc::new(payload),
        }
    }

    /// The payload as `Any`, ready for an [`IntentSink`].
    pub fn payload(&self) -> &dyn Any {
        self.value.as_any()
    }

    /// True when both intents carry the same payload type and equal values.
    pub fn matches(&self, other: &NavigationIntent) -> bool {
        self.value.dyn_eq(other.value.as_ref())
    }

    /// True when the payload is a `P`.
    pub fn is<P: Any>(&self) -> bool {
        self.payload().is::<P>()
    }

    /// The payload, if it is a `P`.
    pub fn downcast_ref<P: Any>(&self) -> Option<&P> {
        self.payload().downcast_ref::<P>()
    }
}

impl fmt::Debug for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NavigationIntent(..)")
    }
}

/// Writable property holder exposed by pages that accept intents.
pub trait IntentSink: Send + Sync {
    /// Applies the payload; returns false when its type does not match the
    /// holder and nothing was written.
    fn apply(&self, intent: &dyn Any) -> bool;
}

/// Stock [`IntentSink`]: a lock around a props value of type `P`, written by
/// cloning a matching payload in.
pub struct PropsCell<P> {
    value: Mutex<P>,
}

impl<P> PropsCell<P>
where
    P: Clone + Send + 'static,
{
    /// Creates the cell with an initial props value.
    pub fn new(initial: P) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Clones the current props value out.
    pub fn get(&self) -> P {
        self.value.lock().clone()
    }

    /// Replaces the props value.
    pub fn set(&self, value: P) {
        *self.value.lock() = value;
    }
}

impl<P> Default for PropsCell<P>
where
    P: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P> IntentSink for PropsCell<P>
where
    P: Clone + Send + 'static,
{
    fn apply(&self, intent: &dyn Any) -> bool {
        match intent.downcast_ref::<P>() {
            Some(props) => {
                *self.value.lock() = props.clone();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct DetailIntent {
        id: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct OtherIntent {
        id: u32,
    }

    #[test]
    fn equal_values_of_same_type_match() {
        let a = NavigationIntent::new(DetailIntent { id: 7 });
        let b = NavigationIntent::new(DetailIntent { id: 7 });
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn unequal_values_do_not_match() {
        let a = NavigationIntent::new(DetailIntent { id: 7 });
        let b = NavigationIntent::new(DetailIntent { id: 8 });
        assert!(!a.matches(&b));
    }

    #[test]
    fn different_types_never_match() {
        // Structurally identical, but distinct types.
        let a = NavigationIntent::new(DetailIntent { id: 7 });
        let b = NavigationIntent::new(OtherIntent { id: 7 });
        assert!(!a.matches(&b));
        assert!(!b.matches(&a));
    }

    #[test]
    fn props_cell_applies_matching_payload() {
        let cell = PropsCell::new(DetailIntent { id: 0 });
        let intent = NavigationIntent::new(DetailIntent { id: 42 });
        assert!(cell.apply(intent.payload()));
        assert_eq!(cell.get(), DetailIntent { id: 42 });
    }

    #[test]
    fn props_cell_rejects_mismatched_payload() {
        let cell = PropsCell::new(DetailIntent { id: 0 });
        let intent = NavigationIntent::new(OtherIntent { id: 42 });
        assert!(!cell.apply(intent.payload()));
        assert_eq!(cell.get(), DetailIntent { id: 0 });
    }
}
