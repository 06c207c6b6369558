// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At-most-once completion cell.
//!
//! A [`Promise`] is the coordinator's future type: many holders, any number
//! of waiters, and exactly one completion. Clones share the same slot, so
//! completing through one clone wakes waiters on all of them.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared completion cell. The first `complete` wins; later calls are
/// rejected and leave the stored value untouched.
#[derive(Debug, Clone)]
pub struct Promise<T: Clone> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T: Clone> Promise<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A promise that is already complete.
    pub fn completed(value: T) -> Self {
        let promise = Self::new();
        promise.complete(value);
        promise
    }

    /// Store the value if the slot is still empty. Returns whether this
    /// call was the one that completed the promise.
    pub fn complete(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(value);
                true
            } else {
                false
            }
        })
    }

    pub fn is_done(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The stored value, if completed.
    pub fn peek(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Wait until the promise completes and return a clone of the value.
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            // The sender lives at least as long as `self`, so this only
            // returns once the slot has been written.
            let _ = rx.changed().await;
        }
    }
}

impl<T: Clone> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "promise_tests.rs"]
mod tests;
