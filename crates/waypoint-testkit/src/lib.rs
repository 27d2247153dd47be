//! Waypoint test infrastructure.
//!
//! Provides the pieces navigation tests keep rebuilding: an in-memory fake
//! host surface with the full items/sections/contents shape, page
//! components instrumented to record their lifecycle hooks, a recorder for
//! the lifecycle event stream, and counting scoped services for disposal
//! assertions.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waypoint_core::prelude::*;
//! use waypoint_testkit::*;
//!
//! # async fn demo() -> Result<(), NavigationError> {
//! let shell = ShellBuilder::new().single::<HomePage>().build();
//! let log = HookLog::default();
//! let navigator = Navigator::builder()
//!     .host(shell.clone())
//!     .register::<HomePage, _>({
//!         let log = log.clone();
//!         move |_| Arc::new(HomePage::new(log.clone()))
//!     })
//!     .root::<HomePage>()
//!     .build()?;
//! wire(&shell, &navigator);
//! navigator.initialize().await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod pages;
pub mod recorder;
pub mod services;
pub mod shell;

pub use pages::{
    DetailPage, DetailProps, GuardFlag, HomePage, HookLog, SecondPage, SettingsPage, SlowPage,
};
pub use recorder::LifecycleRecorder;
pub use services::{CountingService, DisposalCounter};
pub use shell::{FakeShell, ShellBuilder};

use std::sync::Arc;

use waypoint_core::Navigator;

/// Binds a navigator's engine-side handles into a fake shell.
pub fn wire(shell: &Arc<FakeShell>, navigator: &Navigator) {
    shell.bind(navigator.materializer(), navigator.structure_events());
}

/// Installs a test tracing subscriber (once; later calls are no-ops).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
