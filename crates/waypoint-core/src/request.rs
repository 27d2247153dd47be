//! # Navigation Requests
//!
//! A [`NavigationRequest`] is an immutable description of where the user
//! should be: an ordered list of segments, absolute or relative, with an
//! optional behavior and an optional one-shot [`NavigationIntent`].
//!
//! Requests are built fluently:
//!
//! ```ignore
//! navigator.go_to(Navigation::absolute().root::<HomePage>().add::<DetailPage>()).await?;
//! navigator.go_to(Navigation::relative().push::<DetailPage>()).await?;
//! navigator.go_to(Navigation::relative().pop()).await?;
//! ```
//!
//! The absolute builder is typestate: `root` must come first and cannot be
//! repeated, `add` is only available afterwards, so a request with pages
//! but no root does not compile.

use crate::errors::NavigationError;
use crate::intent::NavigationIntent;
use crate::page::{Screen, ScreenType};

/// One screen-addressing segment of a navigation path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenSegment {
    /// The screen type this segment materializes.
    pub screen: ScreenType,
    /// Route segment name; defaults to the screen's segment, overridable
    /// with a custom route.
    pub segment: String,
}

impl ScreenSegment {
    /// Segment for screen `T` under its default route.
    pub fn of<T: Screen>() -> Self {
        let screen = ScreenType::of::<T>();
        Self {
            screen,
            segment: screen.segment().to_owned(),
        }
    }

    /// Segment for screen `T` under a custom route.
    pub fn with_route<T: Screen>(route: impl Into<String>) -> Self {
        Self {
            screen: ScreenType::of::<T>(),
            segment: route.into(),
        }
    }
}

/// One element of a navigation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationSegment {
    /// Navigate to (or push) a screen.
    Screen(ScreenSegment),
    /// Remove the topmost page.
    Pop,
    /// Remove every pushed page, returning to the content root.
    PopAll,
}

impl NavigationSegment {
    /// Path rendering of this segment.
    pub fn render(&self) -> &str {
        match self {
            Self::Screen(s) => &s.segment,
            Self::Pop => "..",
            Self::PopAll => "...",
        }
    }
}

/// Behavior modifiers attached to a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationBehavior {
    /// Skip the leaving-guard phase for this navigation.
    pub ignore_guards: bool,
}

impl NavigationBehavior {
    /// Behavior that bypasses leaving guards.
    pub fn ignoring_guards() -> Self {
        Self {
            ignore_guards: true,
        }
    }
}

/// Immutable description of a navigation intent.
#[derive(Clone, Debug)]
pub struct NavigationRequest {
    segments: Vec<NavigationSegment>,
    absolute: bool,
    behavior: NavigationBehavior,
    intent: Option<NavigationIntent>,
}

impl NavigationRequest {
    /// Assembles an absolute request from raw segments.
    ///
    /// This is the escape hatch for requests composed at runtime (the host
    /// tab-tap interception uses it); fluent call sites should prefer the
    /// builders.
    pub fn absolute_from_segments(
        segments: Vec<ScreenSegment>,
        behavior: NavigationBehavior,
    ) -> Result<Self, NavigationError> {
        if segments.is_empty() {
            return Err(NavigationError::InvalidRequest(
                "an absolute request requires at least a root segment",
            ));
        }
        Ok(Self {
            segments: segments.into_iter().map(NavigationSegment::Screen).collect(),
            absolute: true,
            behavior,
            intent: None,
        })
    }

    /// Whether this request names an absolute position.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The behavior modifiers.
    pub fn behavior(&self) -> NavigationBehavior {
        self.behavior
    }

    /// The one-shot intent for the final target page, if any.
    pub fn intent(&self) -> Option<&NavigationIntent> {
        self.intent.as_ref()
    }

    /// The ordered request segments.
    pub fn segments(&self) -> &[NavigationSegment] {
        &self.segments
    }

    /// The screen segments of an absolute request, in order.
    pub(crate) fn screen_segments(&self) -> Vec<&ScreenSegment> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                NavigationSegment::Screen(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// The navigation path: segment names joined by `/`, prefixed `//` when
    /// absolute. Used for matching and diagnostics, never persisted.
    pub fn path(&self) -> String {
        let joined = self
            .segments
            .iter()
            .map(NavigationSegment::render)
            .collect::<Vec<_>>()
            .join("/");
        if self.absolute {
            format!("//{joined}")
        } else {
            joined
        }
    }

    /// Compares two requests: equal paths, and intents that are either both
    /// absent or of the same declared type with equal values.
    pub fn matches(&self, other: &NavigationRequest) -> bool {
        if self.path() != other.path() {
            return false;
        }
        match (&self.intent, &other.intent) {
            (None, None) => true,
            (Some(a), Some(b)) => a.matches(b),
            _ => false,
        }
    }
}

/// Entry points for the request builders.
pub struct Navigation;

impl Navigation {
    /// Starts an absolute navigation.
    pub fn absolute() -> AbsoluteNavigation {
        AbsoluteNavigation {
            behavior: NavigationBehavior::default(),
        }
    }

    /// Starts an absolute navigation with a custom behavior.
    pub fn absolute_with(behavior: NavigationBehavior) -> AbsoluteNavigation {
        AbsoluteNavigation { behavior }
    }

    /// Starts a relative navigation.
    pub fn relative() -> RelativeNavigation {
        RelativeNavigation {
            segments: Vec::new(),
            behavior: NavigationBehavior::default(),
        }
    }

    /// Starts a relative navigation with a custom behavior.
    pub fn relative_with(behavior: NavigationBehavior) -> RelativeNavigation {
        RelativeNavigation {
            segments: Vec::new(),
            behavior,
        }
    }
}

/// Initial stage of an absolute navigation: only a root can be chosen.
pub struct AbsoluteNavigation {
    behavior: NavigationBehavior,
}

impl AbsoluteNavigation {
    /// Targets the root content hosting screen `T`.
    pub fn root<T: Screen>(self) -> AbsoluteNavigationBuilder {
        AbsoluteNavigationBuilder {
            segments: vec![ScreenSegment::of::<T>()],
            behavior: self.behavior,
        }
    }

    /// Targets the root content hosting screen `T` under a custom route.
    pub fn root_with_route<T: Screen>(self, route: impl Into<String>) -> AbsoluteNavigationBuilder {
        AbsoluteNavigationBuilder {
            segments: vec![ScreenSegment::with_route::<T>(route)],
            behavior: self.behavior,
        }
    }
}

/// An absolute navigation with its root chosen; pages can be stacked on top.
pub struct AbsoluteNavigationBuilder {
    segments: Vec<ScreenSegment>,
    behavior: NavigationBehavior,
}

impl AbsoluteNavigationBuilder {
    /// Adds a page to the target navigation stack.
    pub fn add<T: Screen>(mut self) -> Self {
        self.segments.push(ScreenSegment::of::<T>());
        self
    }

    /// Attaches a one-shot intent for the final target page and finishes
    /// the request.
    pub fn with_intent<P>(self, payload: P) -> NavigationRequest
    where
        P: std::any::Any + Send + Sync + PartialEq,
    {
        let mut request = NavigationRequest::from(self);
        request.intent = Some(NavigationIntent::new(payload));
        request
    }
}

impl From<AbsoluteNavigationBuilder> for NavigationRequest {
    fn from(builder: AbsoluteNavigationBuilder) -> Self {
        Self {
            segments: builder
                .segments
                .into_iter()
                .map(NavigationSegment::Screen)
                .collect(),
            absolute: true,
            behavior: builder.behavior,
            intent: None,
        }
    }
}

/// A relative navigation: push/pop operations against the current stack.
pub struct RelativeNavigation {
    segments: Vec<NavigationSegment>,
    behavior: NavigationBehavior,
}

impl RelativeNavigation {
    /// Pushes screen `T` onto the stack.
    pub fn push<T: Screen>(mut self) -> Self {
        self.segments
            .push(NavigationSegment::Screen(ScreenSegment::of::<T>()));
        self
    }

    /// Removes the topmost page.
    pub fn pop(mut self) -> Self {
        self.segments.push(NavigationSegment::Pop);
        self
    }

    /// Removes every pushed page, returning to the content root.
    pub fn pop_all(mut self) -> Self {
        self.segments.push(NavigationSegment::PopAll);
        self
    }

    /// Alias for [`RelativeNavigation::pop_all`].
    pub fn to_root(self) -> Self {
        self.pop_all()
    }

    /// Attaches a one-shot intent for the final target page and finishes
    /// the request. Fails on an empty request: there is no target to
    /// deliver the intent to.
    pub fn with_intent<P>(self, payload: P) -> Result<NavigationRequest, NavigationError>
    where
        P: std::any::Any + Send + Sync + PartialEq,
    {
        if self.segments.is_empty() {
            return Err(NavigationError::InvalidRequest(
                "cannot attach an intent to an empty navigation",
            ));
        }
        let mut request = NavigationRequest::from(self);
        request.intent = Some(NavigationIntent::new(payload));
        Ok(request)
    }
}

impl From<RelativeNavigation> for NavigationRequest {
    fn from(builder: RelativeNavigation) -> Self {
        Self {
            segments: builder.segments,
            absolute: false,
            behavior: builder.behavior,
            intent: None,
        }
    }
}
