mod support;

use std::sync::Arc;
use std::time::Duration;

use session_core::{Credentials, Navigator, RedirectMemory, RouteTable, SessionGate};
use support::Harness;

fn navigator(start: &str) -> (Arc<Navigator>, Arc<RedirectMemory>) {
    let memory = Arc::new(RedirectMemory::new());
    let gate = SessionGate::new(RouteTable::default(), memory.clone());
    (Arc::new(Navigator::new(gate, start)), memory)
}

fn credentials() -> Credentials {
    Credentials::new("ana@example.com", "correct horse")
}

#[tokio::test]
async fn no_redirect_before_hydration_completes() {
    let h = Harness::empty();
    let (nav, memory) = navigator("/dashboard/history");

    assert_eq!(nav.settle(&h.store.state()), "/dashboard/history");
    assert_eq!(memory.peek(), None);

    h.store.hydrate().await;
    assert_eq!(nav.settle(&h.store.state()), "/login");
}

#[tokio::test]
async fn redirect_memory_is_consumed_once() {
    let h = Harness::empty();
    h.store.hydrate().await;
    let (nav, memory) = navigator("/");

    assert_eq!(nav.visit(&h.store.state(), "/dashboard/history"), "/login");
    assert_eq!(memory.peek().as_deref(), Some("/dashboard/history"));

    h.store.login(credentials()).await.unwrap();
    assert_eq!(nav.settle(&h.store.state()), "/dashboard/history");
    assert_eq!(memory.peek(), None);

    assert_eq!(nav.visit(&h.store.state(), "/login"), "/dashboard");
}

#[tokio::test]
async fn last_blocked_path_wins() {
    let h = Harness::empty();
    h.store.hydrate().await;
    let (nav, memory) = navigator("/");

    nav.visit(&h.store.state(), "/a");
    nav.visit(&h.store.state(), "/b");

    assert_eq!(memory.peek().as_deref(), Some("/b"));
    h.store.login(credentials()).await.unwrap();
    assert_eq!(nav.settle(&h.store.state()), "/b");
}

#[tokio::test]
async fn restored_session_keeps_protected_location() {
    let snapshot = support::persisted(
        support::user("Ana"),
        support::epoch() + chrono::Duration::hours(2),
    );
    let h = Harness::restoring(&snapshot);
    let (nav, _) = navigator("/dashboard/profile");

    h.store.hydrate().await;

    assert_eq!(nav.settle(&h.store.state()), "/dashboard/profile");
}

#[tokio::test]
async fn following_navigator_reacts_to_logout() {
    let h = Harness::signed_in().await;
    let (nav, memory) = navigator("/dashboard/history");
    let follower = tokio::spawn(nav.clone().follow(h.store.subscribe()));

    h.store.logout().await;

    let redirected = tokio::time::timeout(Duration::from_secs(2), async {
        while nav.current() != "/login" {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(redirected.is_ok(), "navigator stayed on {}", nav.current());
    assert_eq!(memory.peek().as_deref(), Some("/dashboard/history"));

    follower.abort();
}
