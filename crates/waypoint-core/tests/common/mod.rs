//! Shared wiring for the navigation integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use waypoint_core::shell::SectionRef;
use waypoint_core::{Navigator, ServiceScopeExt};
use waypoint_testkit::{
    wire, CountingService, DetailPage, DisposalCounter, FakeShell, GuardFlag, HomePage, HookLog,
    LifecycleRecorder, SecondPage, SettingsPage, ShellBuilder, SlowPage,
};

/// A two-tab surface (Home, Settings) with every test screen registered.
pub struct Harness {
    pub shell: Arc<FakeShell>,
    pub navigator: Navigator,
    pub log: HookLog,
    pub guard: GuardFlag,
    pub recorder: LifecycleRecorder,
    /// Counts disposals of the service registered into each
    /// [`SecondPage`] scope.
    pub second_disposals: DisposalCounter,
}

impl Harness {
    pub fn home_section() -> SectionRef {
        SectionRef {
            item: "HomePage".to_owned(),
            section: "HomePage".to_owned(),
        }
    }

    pub fn settings_section() -> SectionRef {
        SectionRef {
            item: "SettingsPage".to_owned(),
            section: "SettingsPage".to_owned(),
        }
    }

    /// Segments of the home push stack, bottom first.
    pub fn home_stack(&self) -> Vec<String> {
        self.shell.nav_stack_segments(&Self::home_section())
    }
}

pub fn harness() -> Harness {
    waypoint_testkit::init_test_tracing();

    let shell = ShellBuilder::new()
        .single::<HomePage>()
        .single::<SettingsPage>()
        .build();
    let log = HookLog::default();
    let guard = GuardFlag::default();
    let second_disposals = DisposalCounter::default();

    let navigator = Navigator::builder()
        .host(shell.clone())
        .register::<HomePage, _>({
            let log = log.clone();
            move |_| Arc::new(HomePage::new(log.clone()))
        })
        .register::<SecondPage, _>({
            let log = log.clone();
            let guard = guard.clone();
            let second_disposals = second_disposals.clone();
            move |scope| {
                scope.add_scoped(CountingService::new(second_disposals.clone()));
                Arc::new(SecondPage::new(log.clone(), guard.clone()))
            }
        })
        .register::<DetailPage, _>({
            let log = log.clone();
            move |_| Arc::new(DetailPage::new(log.clone()))
        })
        .register::<SlowPage, _>({
            let log = log.clone();
            move |_| Arc::new(SlowPage::new(log.clone()))
        })
        .register::<SettingsPage, _>(|_| Arc::new(SettingsPage::new()))
        .root::<HomePage>()
        .build()
        .expect("harness navigator must build");
    wire(&shell, &navigator);
    let recorder = LifecycleRecorder::attach(&navigator);

    Harness {
        shell,
        navigator,
        log,
        guard,
        recorder,
        second_disposals,
    }
}

/// A harness that has already navigated to its Home root.
pub async fn initialized_harness() -> Harness {
    let h = harness();
    h.navigator
        .initialize()
        .await
        .expect("initial navigation must succeed");
    h.log.clear();
    h.recorder.drain();
    h
}
