// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber state (§3, §4.6): everything the Broadcast Fabric owns
//! about one connected peer.

use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use vrlog_core::CompiledFilter;

use crate::wire::Frame;

/// Outbound queue capacity per subscriber (§9: the only queue allowed to
/// drop). Overridable via `VRLOG_SUBSCRIBER_QUEUE_CAPACITY`.
pub fn default_queue_capacity() -> usize {
    std::env::var("VRLOG_SUBSCRIBER_QUEUE_CAPACITY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SubscriberCounters {
    pub sent: u64,
    pub dropped: u64,
}

/// Filter set compiled once per mutation (§9), guarded by its own lock so
/// fan-out never contends with the registry's read lock.
#[derive(Default)]
pub struct FilterSet {
    clauses: Vec<CompiledFilter>,
}

impl FilterSet {
    pub fn matches(&self, record: &vrlog_core::ProcessedRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }

    pub fn add(&mut self, compiled: CompiledFilter) {
        self.clauses.retain(|c| c.clause_id != compiled.clause_id);
        self.clauses.push(compiled);
    }

    /// Removes the clause with this id, returning whether one was present.
    pub fn remove(&mut self, clause_id: &str) -> bool {
        let before = self.clauses.len();
        self.clauses.retain(|c| c.clause_id != clause_id);
        self.clauses.len() != before
    }
}

/// Everything the fan-out path needs about one subscriber, reachable
/// through thread-safe operations only (queue push, filter lock).
pub struct Subscriber {
    pub id: String,
    pub advertised_name: String,
    pub connected_at: Instant,
    pub last_seen: Mutex<Instant>,
    pub alive: std::sync::atomic::AtomicBool,
    pub filters: Mutex<FilterSet>,
    pub outbound: mpsc::Sender<Frame>,
    pub counters: Mutex<SubscriberCounters>,
}

impl Subscriber {
    pub fn new(id: String, advertised_name: String, outbound: mpsc::Sender<Frame>) -> Self {
        let now = Instant::now();
        Self {
            id,
            advertised_name,
            connected_at: now,
            last_seen: Mutex::new(now),
            alive: std::sync::atomic::AtomicBool::new(true),
            filters: Mutex::new(FilterSet::default()),
            outbound,
            counters: Mutex::new(SubscriberCounters::default()),
        }
    }

    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
        self.alive.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    /// Enqueues `frame` for delivery; on a full queue, drops it and
    /// increments the subscriber's `dropped` counter (§4.7, §9). Never
    /// blocks the caller.
    pub fn try_enqueue(&self, frame: Frame) {
        match self.outbound.try_send(frame) {
            Ok(()) => self.counters.lock().sent += 1,
            Err(_) => self.counters.lock().dropped += 1,
        }
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
