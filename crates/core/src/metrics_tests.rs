// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn sorted(metrics: &JobMetrics) -> Vec<Measurement> {
    let mut out = metrics.measurements().to_vec();
    out.sort();
    out
}

#[test]
fn of_member_prefixes_every_name() {
    let member = Uuid::new_v4();
    let raw = RawJobMetrics::new(42).with("emitted", 10).with("received", 3);
    let lifted = JobMetrics::of_member(&member, &raw);

    assert_eq!(lifted.len(), 2);
    for m in lifted.measurements() {
        assert!(m.name.starts_with(&member_prefix(&member)), "unprefixed: {}", m.name);
        assert_eq!(m.timestamp_ms, 42);
    }
}

#[test]
fn merge_keeps_both_sides() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let merged = JobMetrics::of_member(&a, &RawJobMetrics::new(1).with("emitted", 5))
        .merge(JobMetrics::of_member(&b, &RawJobMetrics::new(2).with("emitted", 7)));

    assert_eq!(merged.len(), 2);
    assert_eq!(merged.values_of(&format!("{}emitted", member_prefix(&a))), vec![5]);
    assert_eq!(merged.values_of(&format!("{}emitted", member_prefix(&b))), vec![7]);
}

#[test]
fn empty_is_identity() {
    let member = Uuid::new_v4();
    let a = JobMetrics::of_member(&member, &RawJobMetrics::new(9).with("x", 1));
    assert_eq!(a.clone().merge(JobMetrics::empty()), a);
    assert_eq!(sorted(&JobMetrics::empty().merge(a.clone())), sorted(&a));
}

fn arb_metrics() -> impl Strategy<Value = JobMetrics> {
    (
        proptest::collection::vec(("[a-z]{1,6}", -1000i64..1000), 0..8),
        0u64..10_000,
        proptest::array::uniform16(any::<u8>()),
    )
        .prop_map(|(values, ts, uuid_bytes)| {
            let member = Uuid::from_bytes(uuid_bytes);
            let mut raw = RawJobMetrics::new(ts);
            for (name, value) in values {
                raw = raw.with(name, value);
            }
            JobMetrics::of_member(&member, &raw)
        })
}

proptest! {
    #[test]
    fn merge_is_associative(a in arb_metrics(), b in arb_metrics(), c in arb_metrics()) {
        let left = a.clone().merge(b.clone().merge(c.clone()));
        let right = a.merge(b).merge(c);
        prop_assert_eq!(sorted(&left), sorted(&right));
    }

    #[test]
    fn merge_is_commutative_as_multiset(a in arb_metrics(), b in arb_metrics()) {
        prop_assert_eq!(sorted(&a.clone().merge(b.clone())), sorted(&b.merge(a)));
    }

    #[test]
    fn merge_total_is_union(a in arb_metrics(), b in arb_metrics()) {
        let total = a.len() + b.len();
        prop_assert_eq!(a.merge(b).len(), total);
    }
}
