#![allow(non_snake_case)]

use super::*;
use std::time::Duration;

// ShutdownHandle tests

#[test]
fn ShutdownHandle___new___not_triggered() {
    let handle = ShutdownHandle::new();

    assert!(!handle.is_triggered());
}

#[test]
fn ShutdownHandle___trigger___idempotent() {
    let handle = ShutdownHandle::new();

    handle.trigger();
    handle.trigger();

    assert!(handle.is_triggered());
}

#[test]
fn ShutdownHandle___trigger_without_signals___still_recorded() {
    let handle = ShutdownHandle::default();

    handle.trigger();

    assert!(handle.signal().is_triggered());
}

// ShutdownSignal tests

#[test]
fn ShutdownSignal___is_triggered___reflects_handle_state() {
    let handle = ShutdownHandle::new();
    let signal = handle.signal();
    let cloned = signal.clone();

    assert!(!signal.is_triggered());
    handle.trigger();
    assert!(signal.is_triggered());
    assert!(cloned.is_triggered());
}

#[tokio::test]
async fn ShutdownSignal___wait___returns_when_already_triggered() {
    let handle = ShutdownHandle::new();
    let mut signal = handle.signal();
    handle.trigger();

    tokio::time::timeout(Duration::from_secs(1), signal.wait())
        .await
        .unwrap();
}

#[tokio::test]
async fn ShutdownSignal___cancelled___completes_after_trigger() {
    let handle = ShutdownHandle::new();
    let cancelled = handle.signal().cancelled();

    let task = tokio::spawn(cancelled);
    tokio::task::yield_now().await;
    handle.trigger();

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn ShutdownSignal___wait___pending_when_handle_dropped() {
    let handle = ShutdownHandle::new();
    let mut signal = handle.signal();
    drop(handle);

    let result = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;

    assert!(result.is_err());
}

#[test]
fn ShutdownHandle___clone___triggers_same_signal() {
    let handle = ShutdownHandle::new();
    let signal = handle.signal();
    let clone = handle.clone();

    clone.trigger();

    assert!(handle.is_triggered());
    assert!(signal.is_triggered());
}

#[tokio::test]
async fn ShutdownSignal___wait___completes_when_surviving_clone_triggers() {
    let handle = ShutdownHandle::new();
    let mut signal = handle.signal();
    let clone = handle.clone();
    drop(handle);

    clone.trigger();

    tokio::time::timeout(Duration::from_secs(1), signal.wait())
        .await
        .unwrap();
}
