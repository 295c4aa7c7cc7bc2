#![allow(non_snake_case)]

use super::*;
use crate::sink::MemorySink;

#[test]
fn logging_subscriber___forwards_to_sink() {
    let sink = Arc::new(MemorySink::new());
    let (subscriber, handle) = logging_subscriber(sink.clone(), LogLevel::Info);

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("installed");
        tracing::debug!("hidden");
    });

    assert_eq!(sink.messages(), vec!["installed".to_string()]);
    assert_eq!(handle.level(), LogLevel::Info);
}

#[test]
fn ReloadHandle___reload_level___changes_filtering() {
    let sink = Arc::new(MemorySink::new());
    let (subscriber, handle) = logging_subscriber(sink.clone(), LogLevel::Warn);

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("before");
        handle.reload_level(LogLevel::Debug).unwrap();
        tracing::debug!("after");
    });

    assert_eq!(sink.messages(), vec!["after".to_string()]);
    assert_eq!(handle.filter().level(), LogLevel::Debug);
}

#[test]
fn ReloadHandle___reload_to_off___silences_everything() {
    let sink = Arc::new(MemorySink::new());
    let (subscriber, handle) = logging_subscriber(sink.clone(), LogLevel::Trace);

    tracing::subscriber::with_default(subscriber, || {
        handle.reload_level(LogLevel::Off).unwrap();
        tracing::error!("nobody hears this");
    });

    assert!(sink.records().is_empty());
}

#[test]
fn convert_level_to_filter___maps_every_level() {
    assert_eq!(convert_level_to_filter(LogLevel::Trace), LevelFilter::TRACE);
    assert_eq!(convert_level_to_filter(LogLevel::Warn), LevelFilter::WARN);
    assert_eq!(convert_level_to_filter(LogLevel::Off), LevelFilter::OFF);
}

#[test]
fn init_logging___second_call_does_not_panic() {
    let first = init_logging(Arc::new(MemorySink::new()), LogLevel::Info);
    let second = init_logging(Arc::new(MemorySink::new()), LogLevel::Error);

    assert_eq!(first.level(), LogLevel::Info);
    assert_eq!(second.level(), LogLevel::Error);
}
