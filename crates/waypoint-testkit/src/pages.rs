//! Instrumented page components.
//!
//! Four screens covering the shapes navigation tests need: a fully hooked
//! home page, a guarded page, a props-receiving detail page, and a bare
//! page with no capabilities at all. Hook invocations are recorded into a
//! shared [`HookLog`] so tests can assert ordering across pages.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use waypoint_core::intent::{IntentSink, PropsCell};
use waypoint_core::page::{
    AppearingAware, DisappearingAware, EnteringAware, HookResult, LeavingAware, LeavingGuard,
    PageComponent, Screen,
};

/// Shared, ordered record of lifecycle hook invocations.
#[derive(Clone, Default)]
pub struct HookLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl HookLog {
    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// All entries recorded so far, in order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Drops all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Test control over a page's leaving guard.
#[derive(Clone)]
pub struct GuardFlag {
    allow: Arc<AtomicBool>,
    asked: Arc<AtomicUsize>,
}

impl Default for GuardFlag {
    fn default() -> Self {
        Self {
            allow: Arc::new(AtomicBool::new(true)),
            asked: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl GuardFlag {
    /// Makes the guard decline future leave attempts.
    pub fn deny(&self) {
        self.allow.store(false, Ordering::SeqCst);
    }

    /// Makes the guard permit future leave attempts.
    pub fn allow(&self) {
        self.allow.store(true, Ordering::SeqCst);
    }

    /// How many times the guard has been consulted.
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }

    fn decide(&self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.allow.load(Ordering::SeqCst)
    }
}

/// Fully hooked page: implements all four lifecycle capabilities.
pub struct HomePage {
    log: HookLog,
}

impl HomePage {
    /// A home page recording into `log`.
    pub fn new(log: HookLog) -> Self {
        Self { log }
    }
}

impl Screen for HomePage {}

impl PageComponent for HomePage {
    fn entering(&self) -> Option<&dyn EnteringAware> {
        Some(self)
    }

    fn appearing(&self) -> Option<&dyn AppearingAware> {
        Some(self)
    }

    fn leaving(&self) -> Option<&dyn LeavingAware> {
        Some(self)
    }

    fn disappearing(&self) -> Option<&dyn DisappearingAware> {
        Some(self)
    }
}

#[async_trait]
impl EnteringAware for HomePage {
    async fn on_entering(&self) -> HookResult {
        self.log.record("home:entering");
        Ok(())
    }
}

#[async_trait]
impl AppearingAware for HomePage {
    async fn on_appearing(&self) -> HookResult {
        self.log.record("home:appearing");
        Ok(())
    }
}

#[async_trait]
impl LeavingAware for HomePage {
    async fn on_leaving(&self) -> HookResult {
        self.log.record("home:leaving");
        Ok(())
    }
}

#[async_trait]
impl DisappearingAware for HomePage {
    async fn on_disappearing(&self) -> HookResult {
        self.log.record("home:disappearing");
        Ok(())
    }
}

/// Hooked page with a controllable leaving guard.
pub struct SecondPage {
    log: HookLog,
    guard: GuardFlag,
}

impl SecondPage {
    /// A guarded page recording into `log`.
    pub fn new(log: HookLog, guard: GuardFlag) -> Self {
        Self { log, guard }
    }
}

impl Screen for SecondPage {}

impl PageComponent for SecondPage {
    fn entering(&self) -> Option<&dyn EnteringAware> {
        Some(self)
    }

    fn appearing(&self) -> Option<&dyn AppearingAware> {
        Some(self)
    }

    fn leaving(&self) -> Option<&dyn LeavingAware> {
        Some(self)
    }

    fn disappearing(&self) -> Option<&dyn DisappearingAware> {
        Some(self)
    }

    fn leaving_guard(&self) -> Option<&dyn LeavingGuard> {
        Some(self)
    }
}

#[async_trait]
impl EnteringAware for SecondPage {
    async fn on_entering(&self) -> HookResult {
        self.log.record("second:entering");
        Ok(())
    }
}

#[async_trait]
impl AppearingAware for SecondPage {
    async fn on_appearing(&self) -> HookResult {
        self.log.record("second:appearing");
        Ok(())
    }
}

#[async_trait]
impl LeavingAware for SecondPage {
    async fn on_leaving(&self) -> HookResult {
        self.log.record("second:leaving");
        Ok(())
    }
}

#[async_trait]
impl DisappearingAware for SecondPage {
    async fn on_disappearing(&self) -> HookResult {
        self.log.record("second:disappearing");
        Ok(())
    }
}

#[async_trait]
impl LeavingGuard for SecondPage {
    async fn can_leave(&self) -> bool {
        let decision = self.guard.decide();
        self.log.record(format!("second:can_leave -> {decision}"));
        decision
    }
}

/// Typed navigation intent for [`DetailPage`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailProps {
    /// The entity the detail page should show.
    pub id: u32,
}

/// Props-receiving page: accepts a [`DetailProps`] intent.
pub struct DetailPage {
    log: HookLog,
    props: PropsCell<DetailProps>,
}

impl DetailPage {
    /// A detail page recording into `log`.
    pub fn new(log: HookLog) -> Self {
        Self {
            log,
            props: PropsCell::default(),
        }
    }

    /// The current props value.
    pub fn props(&self) -> DetailProps {
        self.props.get()
    }
}

impl Screen for DetailPage {}

impl PageComponent for DetailPage {
    fn entering(&self) -> Option<&dyn EnteringAware> {
        Some(self)
    }

    fn appearing(&self) -> Option<&dyn AppearingAware> {
        Some(self)
    }

    fn intent_sink(&self) -> Option<&dyn IntentSink> {
        Some(&self.props)
    }
}

#[async_trait]
impl EnteringAware for DetailPage {
    async fn on_entering(&self) -> HookResult {
        self.log.record("detail:entering");
        Ok(())
    }
}

#[async_trait]
impl AppearingAware for DetailPage {
    async fn on_appearing(&self) -> HookResult {
        // Record the props as seen by the hook: intents must land first.
        self.log
            .record(format!("detail:appearing(id={})", self.props.get().id));
        Ok(())
    }
}

/// Page whose Appearing hook genuinely suspends, for ordering tests.
pub struct SlowPage {
    log: HookLog,
}

impl SlowPage {
    /// A slow page recording into `log`.
    pub fn new(log: HookLog) -> Self {
        Self { log }
    }
}

impl Screen for SlowPage {}

impl PageComponent for SlowPage {
    fn entering(&self) -> Option<&dyn EnteringAware> {
        Some(self)
    }

    fn appearing(&self) -> Option<&dyn AppearingAware> {
        Some(self)
    }
}

#[async_trait]
impl EnteringAware for SlowPage {
    async fn on_entering(&self) -> HookResult {
        self.log.record("slow:entering");
        tokio::task::yield_now().await;
        Ok(())
    }
}

#[async_trait]
impl AppearingAware for SlowPage {
    async fn on_appearing(&self) -> HookResult {
        self.log.record("slow:appearing:start");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.log.record("slow:appearing:end");
        Ok(())
    }
}

/// Page with no capabilities at all.
#[derive(Default)]
pub struct SettingsPage;

impl SettingsPage {
    /// A bare settings page.
    pub fn new() -> Self {
        Self
    }
}

impl Screen for SettingsPage {}

impl PageComponent for SettingsPage {}
