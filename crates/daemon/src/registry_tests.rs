// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio::sync::mpsc;

use super::*;

fn make(id: &str) -> Arc<Subscriber> {
    let (tx, _rx) = mpsc::channel(8);
    Arc::new(Subscriber::new(id.to_string(), "tester".to_string(), tx))
}

#[test]
fn rejects_new_connection_at_cap_without_changing_count() {
    let registry = SubscriberRegistry::new(2);
    registry.add(make("a")).unwrap();
    registry.add(make("b")).unwrap();

    let result = registry.add(make("c"));
    assert_eq!(result, Err(RejectReason::ConnectionLimit));
    assert_eq!(registry.len(), 2);
}

#[test]
fn remove_frees_a_slot() {
    let registry = SubscriberRegistry::new(1);
    registry.add(make("a")).unwrap();
    assert!(registry.add(make("b")).is_err());

    registry.remove("a");
    assert!(registry.add(make("b")).is_ok());
}

#[test]
fn each_matching_only_calls_for_accepted_subscribers() {
    use vrlog_core::{parser::parse, RawLine};

    let registry = SubscriberRegistry::new(4);
    registry.add(make("a")).unwrap();

    let raw = RawLine::new("2025.6.30 15:30:15 Error - boom", std::path::PathBuf::from("x"));
    let record = parse(&raw, "id-1".to_string(), 0).expect("parses");

    let mut hits = 0;
    registry.each_matching(&record, |_| hits += 1);
    assert_eq!(hits, 1);
}
