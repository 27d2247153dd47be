//! Categorized navigation errors.
//!
//! Build-time misuse of the request builders is prevented by their types
//! wherever the type system allows; the variants here cover the remaining
//! runtime failures. A declined leaving guard is *not* an error — it is the
//! [`NavigationOutcome::Declined`] completion.
//!
//! [`NavigationOutcome::Declined`]: crate::navigator::NavigationOutcome::Declined

use thiserror::Error;

/// Errors surfaced by the navigation layer.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// A runtime-assembled request was malformed (e.g. empty, or an intent
    /// without a target page).
    #[error("malformed navigation request: {0}")]
    InvalidRequest(&'static str),

    /// An absolute path did not resolve to an existing content. Raised
    /// before any mutation.
    #[error("no content found for path `{path}`")]
    ContentNotFound {
        /// The path that failed to resolve.
        path: String,
    },

    /// A relative `Pop` was applied to a stack already at its root. Raised
    /// before any mutation.
    #[error("cannot pop past the root of the navigation stack")]
    PopPastRoot,

    /// A page that was not created through the navigator has no navigation
    /// context and cannot participate in navigation.
    #[error("page was not created by this navigator and has no navigation context")]
    MissingContext,

    /// A screen type was named in a request but never registered.
    #[error("screen `{screen}` is not registered with the navigator")]
    UnregisteredScreen {
        /// Short name of the unregistered screen type.
        screen: &'static str,
    },

    /// A lifecycle hook failed. Structural changes already applied by the
    /// in-flight navigation are not rolled back.
    #[error("lifecycle hook failed on `{page}`")]
    Lifecycle {
        /// Short name of the page whose hook failed.
        page: &'static str,
        /// The application-supplied failure.
        #[source]
        source: anyhow::Error,
    },

    /// The host asked to materialize a page the navigator never enqueued.
    /// The route-factory queue and the host's materialization callbacks
    /// must stay in 1:1 correspondence.
    #[error("host surface requested a `{screen}` page the navigator did not enqueue")]
    UnexpectedMaterialization {
        /// Short name of the screen type the host asked for.
        screen: &'static str,
    },

    /// The host surface rejected a structural change.
    #[error("host surface rejected a structural change: {source}")]
    Host {
        /// The host-reported failure.
        #[from]
        source: crate::shell::HostError,
    },

    /// The navigator was misconfigured or used before it was wired up.
    #[error("navigator misconfigured: {0}")]
    Configuration(&'static str),
}
