// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn first_completion_wins() {
    let promise: Promise<i32> = Promise::new();
    assert!(!promise.is_done());
    assert!(promise.complete(1));
    assert!(!promise.complete(2));
    assert_eq!(promise.peek(), Some(1));
}

#[test]
fn clones_share_the_slot() {
    let promise: Promise<&'static str> = Promise::new();
    let other = promise.clone();
    assert!(promise.complete("done"));
    assert_eq!(other.peek(), Some("done"));
    assert!(!other.complete("late"));
}

#[test]
fn completed_constructor() {
    let promise = Promise::completed(9);
    assert!(promise.is_done());
    assert_eq!(promise.peek(), Some(9));
}

#[tokio::test]
async fn wait_returns_already_stored_value() {
    let promise = Promise::completed("v");
    assert_eq!(promise.wait().await, "v");
}

#[tokio::test]
async fn wait_wakes_on_completion() {
    let promise: Promise<u64> = Promise::new();
    let waiter = {
        let promise = promise.clone();
        tokio::spawn(async move { promise.wait().await })
    };
    tokio::task::yield_now().await;
    assert!(promise.complete(77));
    assert_eq!(waiter.await.unwrap(), 77);
}

#[tokio::test]
async fn many_waiters_all_wake() {
    let promise: Promise<u64> = Promise::new();
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let promise = promise.clone();
            tokio::spawn(async move { promise.wait().await })
        })
        .collect();
    tokio::task::yield_now().await;
    promise.complete(5);
    for w in waiters {
        assert_eq!(w.await.unwrap(), 5);
    }
}
