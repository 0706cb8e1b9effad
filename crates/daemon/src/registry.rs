// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber Registry (§4.6): the `subscriber_id → subscriber` map,
//! with cap enforcement and the fan-out read path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use vrlog_core::ProcessedRecord;

use crate::subscriber::Subscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ConnectionLimit,
}

/// Single-writer-discipline registry (§5): a read–write lock, readers
/// during fan-out, writers on connect/disconnect/filter mutation.
pub struct SubscriberRegistry {
    max_clients: usize,
    subscribers: RwLock<HashMap<String, Arc<Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            max_clients,
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Admits `subscriber` iff the cap is not already saturated, checked
    /// under the same write lock as the insert (§4.6).
    pub fn add(&self, subscriber: Arc<Subscriber>) -> Result<(), RejectReason> {
        let mut subscribers = self.subscribers.write();
        if subscribers.len() >= self.max_clients {
            return Err(RejectReason::ConnectionLimit);
        }
        subscribers.insert(subscriber.id.clone(), subscriber);
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Subscriber>> {
        self.subscribers.write().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Subscriber>> {
        self.subscribers.read().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().values().cloned().collect()
    }

    /// Fan-out entry point: invokes `f` for every subscriber whose filter
    /// set accepts `record`, under a single shared read lock (§5, §9).
    pub fn each_matching(&self, record: &ProcessedRecord, mut f: impl FnMut(&Arc<Subscriber>)) {
        for subscriber in self.subscribers.read().values() {
            if subscriber.filters.lock().matches(record) {
                f(subscriber);
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
