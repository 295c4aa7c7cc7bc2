#![allow(non_snake_case)]

use super::*;

// RuntimeConfig tests

#[test]
fn RuntimeConfig___default___has_expected_values() {
    let config = RuntimeConfig::default();

    assert_eq!(config.worker_threads, 2);
    assert_eq!(config.thread_name, "hotpush-worker");
    assert_eq!(config.max_blocking_threads, 8);
}

#[test]
fn RuntimeConfig___with_worker_threads___clamps_to_one() {
    let config = RuntimeConfig::new().with_worker_threads(0);

    assert_eq!(config.worker_threads, 1);
}

#[test]
fn RuntimeConfig___builder_chain___combines_options() {
    let config = RuntimeConfig::new()
        .with_worker_threads(3)
        .with_thread_name("update-worker");

    assert_eq!(config.worker_threads, 3);
    assert_eq!(config.thread_name, "update-worker");
}

// AsyncRuntime tests

#[test]
fn AsyncRuntime___with_defaults___creates_runtime() {
    let runtime = AsyncRuntime::with_defaults().unwrap();

    assert!(!runtime.is_shutting_down());
    assert_eq!(runtime.config(), &RuntimeConfig::default());
}

#[test]
fn AsyncRuntime___block_on___executes_future() {
    let runtime = AsyncRuntime::with_defaults().unwrap();

    assert_eq!(runtime.block_on(async { 42 }), 42);
}

#[test]
fn AsyncRuntime___spawn___tracked_by_spawner() {
    let runtime = AsyncRuntime::with_defaults().unwrap();

    let handle = runtime.spawn(async { 123 });

    assert_eq!(runtime.block_on(handle).unwrap(), 123);
    assert_eq!(runtime.spawner().active_tasks(), 0);
}

#[test]
fn AsyncRuntime___shutdown___triggers_signal() {
    let runtime = AsyncRuntime::with_defaults().unwrap();
    let signal = runtime.shutdown_signal();

    runtime.shutdown(Duration::from_millis(100)).unwrap();

    assert!(signal.is_triggered());
    assert!(runtime.is_shutting_down());
}

#[test]
fn AsyncRuntime___shutdown___waits_for_cooperative_tasks() {
    let runtime = AsyncRuntime::with_defaults().unwrap();
    let mut signal = runtime.shutdown_signal();
    let task = runtime.spawn(async move {
        signal.wait().await;
        "stopped"
    });

    runtime.shutdown(Duration::from_secs(2)).unwrap();

    assert_eq!(runtime.block_on(task).unwrap(), "stopped");
}

#[test]
fn AsyncRuntime___shutdown___times_out_on_stuck_task() {
    let runtime = AsyncRuntime::with_defaults().unwrap();
    let _task = runtime.spawn(std::future::pending::<()>());

    let result = runtime.shutdown(Duration::from_millis(50));

    assert!(matches!(result, Err(HcpError::RuntimeError(msg)) if msg.contains("1 task(s)")));
}

#[test]
fn AsyncRuntime___shutdown___triggers_shared_handle() {
    let runtime = AsyncRuntime::with_defaults().unwrap();
    let handle = runtime.shutdown_handle();
    let signal = handle.signal();

    runtime.shutdown(Duration::from_millis(100)).unwrap();

    assert!(handle.is_triggered());
    assert!(signal.is_triggered());
}
