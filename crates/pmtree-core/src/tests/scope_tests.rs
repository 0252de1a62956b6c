use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[test]
fn launching_without_runtime_is_an_error() {
    let scope = WorkScope::new("orphan");
    let err = scope.launch(async {}).unwrap_err();
    assert!(matches!(err, PmError::NoRuntime));
}

#[tokio::test]
async fn cancelled_scope_rejects_new_work() {
    let scope = WorkScope::new("node");
    scope.cancel();
    let err = scope.launch(async {}).unwrap_err();
    assert!(matches!(err, PmError::ScopeCancelled { scope } if scope == "node"));
}

#[tokio::test]
async fn cancelling_parent_cancels_child_scope() {
    let parent = WorkScope::new("node");
    let child = parent.child("node/foreground");
    assert!(child.is_active());

    parent.cancel();
    assert!(!child.is_active());
}

#[tokio::test]
async fn cancelling_child_leaves_parent_running() {
    let parent = WorkScope::new("node");
    let child = parent.child("node/foreground");
    child.cancel();
    assert!(parent.is_active());
}

#[tokio::test]
async fn cancellation_stops_work_at_next_await() {
    let scope = WorkScope::new("node");
    let finished = Arc::new(AtomicBool::new(false));
    let finished_in_task = Arc::clone(&finished);

    let handle = scope
        .launch(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            finished_in_task.store(true, Ordering::SeqCst);
        })
        .unwrap();

    scope.cancel();
    handle.await.unwrap();
    assert!(!finished.load(Ordering::SeqCst));
    assert!(scope.failures().value().is_empty());
}

#[tokio::test]
async fn failures_are_recorded_and_isolated() {
    let scope = WorkScope::new("node");
    let sibling = scope
        .launch(async {
            tokio::task::yield_now().await;
        })
        .unwrap();

    let failing = scope
        .launch_fallible(async { Err::<(), _>("network down") })
        .unwrap();
    failing.await.unwrap();
    sibling.await.unwrap();

    let failures = scope.failures().value();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].message, "network down");
    assert!(!failures[0].panicked);
    assert!(scope.is_active());
}

#[tokio::test]
async fn panics_are_contained_to_their_task() {
    let scope = WorkScope::new("node");
    let handle = scope
        .launch(async {
            panic!("boom");
        })
        .unwrap();
    handle.await.unwrap();

    let failures = scope.failures().value();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].panicked);
    assert!(scope.is_active());
    assert!(scope.launch(async {}).is_ok());
}
