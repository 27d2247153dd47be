//! End-to-end navigation scenarios against the fake host surface.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use waypoint_core::prelude::*;
use waypoint_core::{LifecycleEventKind, LifecycleHandling, NavigationRequest, NavigationScope};
use waypoint_testkit::{
    wire, CountingService, DetailPage, DetailProps, DisposalCounter, HomePage, HookLog,
    SettingsPage, ShellBuilder, SlowPage,
};

use common::{harness, initialized_harness};

#[tokio::test]
async fn absolute_navigation_materializes_root_then_stack() {
    let h = harness();

    let request: NavigationRequest = Navigation::absolute()
        .root::<HomePage>()
        .add::<DetailPage>()
        .into();
    let path = request.path();
    let outcome = h.navigator.go_to(request).await.unwrap();

    assert_eq!(outcome, NavigationOutcome::Completed);
    assert_eq!(h.navigator.current_path(), path);
    assert_eq!(h.navigator.current_path(), "//HomePage/DetailPage");

    // Each newly present page enters then appears, bottom of the stack first.
    assert_eq!(
        h.log.entries(),
        vec![
            "home:entering",
            "home:appearing",
            "detail:entering",
            "detail:appearing(id=0)",
        ]
    );
    assert_eq!(h.navigator.live_page_count(), 2);
}

#[tokio::test]
async fn initialize_navigates_to_the_configured_root() {
    let h = harness();
    let outcome = h.navigator.initialize().await.unwrap();

    assert_eq!(outcome, NavigationOutcome::Completed);
    assert_eq!(h.navigator.current_path(), "//HomePage");
    assert_eq!(h.log.entries(), vec!["home:entering", "home:appearing"]);
}

#[tokio::test]
async fn push_then_pop_returns_to_root_and_disposes_the_scope_once() {
    let h = initialized_harness().await;

    h.navigator
        .go_to(Navigation::relative().push::<waypoint_testkit::SecondPage>())
        .await
        .unwrap();
    assert_eq!(h.navigator.current_path(), "//HomePage/SecondPage");
    assert_eq!(h.home_stack(), vec!["SecondPage"]);

    h.navigator.go_to(Navigation::relative().pop()).await.unwrap();

    assert_eq!(h.navigator.current_path(), "//HomePage");
    assert!(h.home_stack().is_empty());
    assert_eq!(h.second_disposals.count(), 1);
    assert_eq!(h.navigator.live_page_count(), 1);

    // The covered root never disappeared, so popping back to it does not
    // replay its appearing hook.
    assert_eq!(
        h.log.entries(),
        vec![
            "second:entering",
            "second:appearing",
            "second:can_leave -> true",
            "second:disappearing",
            "second:leaving",
        ]
    );
}

#[tokio::test]
async fn pop_at_the_root_fails_and_leaves_the_stack_unchanged() {
    let h = initialized_harness().await;

    let result = h.navigator.go_to(Navigation::relative().pop()).await;

    assert!(matches!(result, Err(NavigationError::PopPastRoot)));
    assert_eq!(h.navigator.current_path(), "//HomePage");
    assert!(h.log.entries().is_empty());
    assert_eq!(h.navigator.live_page_count(), 1);
}

#[tokio::test]
async fn pop_all_returns_to_the_content_root() {
    let h = initialized_harness().await;

    h.navigator
        .go_to(
            Navigation::relative()
                .push::<waypoint_testkit::SecondPage>()
                .push::<DetailPage>(),
        )
        .await
        .unwrap();
    assert_eq!(h.navigator.current_path(), "//HomePage/SecondPage/DetailPage");

    h.navigator
        .go_to(Navigation::relative().to_root())
        .await
        .unwrap();

    assert_eq!(h.navigator.current_path(), "//HomePage");
    assert!(h.home_stack().is_empty());
    assert_eq!(h.navigator.live_page_count(), 1);
}

#[tokio::test]
async fn switching_content_destroys_the_departed_stack() {
    let h = initialized_harness().await;
    h.navigator
        .go_to(Navigation::relative().push::<waypoint_testkit::SecondPage>())
        .await
        .unwrap();
    h.log.clear();

    let outcome = h
        .navigator
        .go_to(Navigation::absolute().root::<SettingsPage>())
        .await
        .unwrap();

    assert_eq!(outcome, NavigationOutcome::Completed);
    assert_eq!(h.navigator.current_path(), "//SettingsPage");
    // The departed pages left topmost first and their scopes are gone.
    assert_eq!(
        h.log.entries(),
        vec![
            "second:can_leave -> true",
            "second:disappearing",
            "second:leaving",
            "home:disappearing",
            "home:leaving",
        ]
    );
    assert_eq!(h.second_disposals.count(), 1);
    assert!(h.home_stack().is_empty());
    // Only the settings root remains alive.
    assert_eq!(h.navigator.live_page_count(), 1);
}

#[tokio::test]
async fn navigating_to_the_current_position_is_a_no_op() {
    let h = initialized_harness().await;
    h.navigator
        .go_to(Navigation::relative().push::<DetailPage>())
        .await
        .unwrap();
    h.log.clear();

    h.navigator
        .go_to(Navigation::absolute().root::<HomePage>().add::<DetailPage>())
        .await
        .unwrap();

    assert!(h.log.entries().is_empty());
    assert_eq!(h.navigator.current_path(), "//HomePage/DetailPage");
    assert_eq!(h.navigator.live_page_count(), 2);
}

#[tokio::test]
async fn pop_push_replaces_the_top_of_the_stack() {
    let h = initialized_harness().await;
    h.navigator
        .go_to(Navigation::relative().push::<waypoint_testkit::SecondPage>())
        .await
        .unwrap();
    h.log.clear();

    h.navigator
        .go_to(Navigation::relative().pop().push::<DetailPage>())
        .await
        .unwrap();

    assert_eq!(h.navigator.current_path(), "//HomePage/DetailPage");
    assert_eq!(h.home_stack(), vec!["DetailPage"]);
    assert_eq!(
        h.log.entries(),
        vec![
            "second:can_leave -> true",
            "second:disappearing",
            "second:leaving",
            "detail:entering",
            "detail:appearing(id=0)",
        ]
    );
}

#[tokio::test]
async fn intent_is_delivered_before_the_appearing_hook() {
    let h = initialized_harness().await;

    h.navigator
        .go_to(
            Navigation::relative()
                .push::<DetailPage>()
                .with_intent(DetailProps { id: 7 })
                .unwrap(),
        )
        .await
        .unwrap();

    // The appearing hook already observed the delivered props.
    assert_eq!(
        h.log.entries(),
        vec!["detail:entering", "detail:appearing(id=7)"]
    );

    // And the event stream reports the delivery before the plain
    // appearing notification.
    let events = h.recorder.drain();
    let with_intent = events
        .iter()
        .position(|e| e.handling == LifecycleHandling::HandledWithIntent)
        .unwrap();
    let appeared = events
        .iter()
        .position(|e| {
            e.kind == LifecycleEventKind::Appearing
                && e.handling == LifecycleHandling::Handled
                && e.screen.name() == "DetailPage"
        })
        .unwrap();
    assert!(with_intent < appeared);
    assert!(events[with_intent].intent.is_some());
}

#[tokio::test]
async fn intent_to_an_already_appeared_page_is_dropped() {
    // Track the created detail pages so their props can be inspected.
    let created: Arc<Mutex<Vec<Arc<DetailPage>>>> = Arc::new(Mutex::new(Vec::new()));
    let shell = ShellBuilder::new().single::<HomePage>().build();
    let log = HookLog::default();
    let navigator = Navigator::builder()
        .host(shell.clone())
        .register::<HomePage, _>({
            let log = log.clone();
            move |_| Arc::new(HomePage::new(log.clone()))
        })
        .register::<DetailPage, _>({
            let log = log.clone();
            let created = created.clone();
            move |_| {
                let page = Arc::new(DetailPage::new(log.clone()));
                created.lock().push(page.clone());
                page
            }
        })
        .root::<HomePage>()
        .build()
        .unwrap();
    wire(&shell, &navigator);
    navigator.initialize().await.unwrap();

    navigator
        .go_to(
            Navigation::relative()
                .push::<DetailPage>()
                .with_intent(DetailProps { id: 7 })
                .unwrap(),
        )
        .await
        .unwrap();

    // Navigating to the same position with a fresh intent materializes
    // nothing and the already-appeared page keeps its props.
    navigator
        .go_to(
            Navigation::absolute()
                .root::<HomePage>()
                .add::<DetailPage>()
                .with_intent(DetailProps { id: 9 }),
        )
        .await
        .unwrap();

    let pages = created.lock();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].props(), DetailProps { id: 7 });
}

#[tokio::test]
async fn queued_navigation_waits_for_the_in_flight_one() {
    let h = initialized_harness().await;

    // Submit both without awaiting the first: the second must not start
    // its structural phase before the first's lifecycle phase completes,
    // even though the first suspends inside its appearing hook.
    let first = h.navigator.go_to(Navigation::relative().push::<SlowPage>());
    let second = h.navigator.go_to(Navigation::relative().push::<DetailPage>());
    let (first, second) = futures::join!(first, second);
    first.unwrap();
    second.unwrap();

    assert_eq!(
        h.log.entries(),
        vec![
            "slow:entering",
            "slow:appearing:start",
            "slow:appearing:end",
            "detail:entering",
            "detail:appearing(id=0)",
        ]
    );
    assert_eq!(h.navigator.current_path(), "//HomePage/SlowPage/DetailPage");
}

#[tokio::test]
async fn lifecycle_events_carry_handling_information() {
    let h = harness();
    h.navigator.initialize().await.unwrap();

    let events = h.recorder.drain();
    let entering = events
        .iter()
        .find(|e| e.kind == LifecycleEventKind::Entering)
        .unwrap();
    assert_eq!(entering.screen.name(), "HomePage");
    assert_eq!(entering.handling, LifecycleHandling::Handled);
}

#[tokio::test]
async fn unregistered_screen_is_reported() {
    // DetailPage is deliberately not registered here.
    let shell = ShellBuilder::new().single::<HomePage>().build();
    let log = HookLog::default();
    let navigator = Navigator::builder()
        .host(shell.clone())
        .register::<HomePage, _>({
            let log = log.clone();
            move |_| Arc::new(HomePage::new(log.clone()))
        })
        .root::<HomePage>()
        .build()
        .unwrap();
    wire(&shell, &navigator);
    navigator.initialize().await.unwrap();

    let result = navigator
        .go_to(Navigation::relative().push::<DetailPage>())
        .await;
    assert!(matches!(
        result,
        Err(NavigationError::UnregisteredScreen { screen: "DetailPage" })
    ));
}

#[tokio::test]
async fn absolute_path_to_a_missing_content_is_not_found() {
    let h = initialized_harness().await;

    // SlowPage is registered but no content hosts it as a root.
    let result = h
        .navigator
        .go_to(Navigation::absolute().root::<SlowPage>())
        .await;

    assert!(matches!(
        result,
        Err(NavigationError::ContentNotFound { .. })
    ));
    // Aborted before any mutation.
    assert_eq!(h.navigator.current_path(), "//HomePage");
}

#[tokio::test]
async fn path_property_holds_for_absolute_requests() {
    for (request, expected) in [
        (
            NavigationRequest::from(Navigation::absolute().root::<HomePage>()),
            "//HomePage",
        ),
        (
            NavigationRequest::from(
                Navigation::absolute()
                    .root::<HomePage>()
                    .add::<waypoint_testkit::SecondPage>(),
            ),
            "//HomePage/SecondPage",
        ),
        (
            NavigationRequest::from(
                Navigation::absolute()
                    .root::<HomePage>()
                    .add::<waypoint_testkit::SecondPage>()
                    .add::<DetailPage>(),
            ),
            "//HomePage/SecondPage/DetailPage",
        ),
    ] {
        let h = harness();
        assert_eq!(request.path(), expected);
        h.navigator.go_to(request).await.unwrap();
        assert_eq!(h.navigator.current_path(), expected);
    }
}

#[tokio::test]
async fn page_scopes_resolve_through_the_parent_provider() {
    let shell = ShellBuilder::new().single::<HomePage>().build();
    let log = HookLog::default();
    let parent_disposals = DisposalCounter::default();
    let parent: Arc<dyn ServiceScope> = Arc::new(NavigationScope::new(None));
    parent.add_scoped(CountingService::new(parent_disposals.clone()));

    let resolved_through_parent = Arc::new(AtomicBool::new(false));
    let navigator = Navigator::builder()
        .host(shell.clone())
        .parent_services(parent)
        .register::<HomePage, _>({
            let log = log.clone();
            let resolved = resolved_through_parent.clone();
            move |scope| {
                // The fresh page scope has no local registration; resolution
                // must fall through to the application-level provider.
                resolved.store(scope.get::<CountingService>().is_some(), Ordering::SeqCst);
                Arc::new(HomePage::new(log.clone()))
            }
        })
        .root::<HomePage>()
        .build()
        .unwrap();
    wire(&shell, &navigator);
    navigator.initialize().await.unwrap();

    assert!(resolved_through_parent.load(Ordering::SeqCst));
    // Parent-level services outlive any page scope.
    assert_eq!(parent_disposals.count(), 0);
}
