#![allow(non_snake_case)]

use super::*;
use std::sync::atomic::AtomicUsize;
use test_case::test_case;

fn memory_filter(level: LogLevel) -> (Arc<MemorySink>, LogFilter) {
    let sink = Arc::new(MemorySink::new());
    let filter = LogFilter::new(sink.clone(), level);
    (sink, filter)
}

#[test_case(LogLevel::Trace, false)]
#[test_case(LogLevel::Debug, false)]
#[test_case(LogLevel::Info, true)]
#[test_case(LogLevel::Warn, true)]
#[test_case(LogLevel::Error, true)]
#[test_case(LogLevel::Off, false ; "off is never a record level")]
fn LogFilter___is_enabled___at_info(level: LogLevel, expected: bool) {
    let (_sink, filter) = memory_filter(LogLevel::Info);

    assert_eq!(filter.is_enabled(level), expected);
}

#[test]
fn LogFilter___log___forwards_enabled_records() {
    let (sink, filter) = memory_filter(LogLevel::Warn);

    filter.log(LogLevel::Info, "hotpush", "dropped");
    filter.log(LogLevel::Error, "hotpush", "kept");

    assert_eq!(
        sink.records(),
        vec![LogRecord {
            level: LogLevel::Error,
            target: "hotpush".to_string(),
            message: "kept".to_string(),
        }]
    );
}

#[test]
fn LogFilter___set_level___shared_between_clones() {
    let (_sink, filter) = memory_filter(LogLevel::Info);
    let clone = filter.clone();

    clone.set_level(LogLevel::Off);

    assert_eq!(filter.level(), LogLevel::Off);
    assert!(!filter.is_enabled(LogLevel::Error));
}

#[test]
fn LogSink___closure___receives_records() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let filter = LogFilter::new(
        Arc::new(move |_: LogLevel, _: &str, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        LogLevel::Trace,
    );

    filter.log(LogLevel::Debug, "t", "m");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn MemorySink___contains___searches_messages() {
    let sink = MemorySink::new();
    sink.log(LogLevel::Info, "t", "downloaded version 2");

    assert!(sink.contains("version 2"));
    assert!(!sink.contains("version 3"));
    assert_eq!(sink.messages(), vec!["downloaded version 2".to_string()]);
}

#[test]
fn LogFilter___debug___shows_level() {
    let (_sink, filter) = memory_filter(LogLevel::Debug);

    assert!(format!("{filter:?}").contains("Debug"));
}
