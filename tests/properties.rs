//! Property tests for the admission gate.

use std::time::Duration;

use proptest::prelude::*;

use admission_gate::{DenyReason, RequestDescriptor};

mod common;

use common::{single_class, test_gate};

proptest! {
    #[test]
    fn first_n_allowed_then_limited(max in 1u32..40, extra in 1usize..20) {
        let t = test_gate(single_class(max, 60_000));
        let request = RequestDescriptor::new("203.0.113.5", "/");

        for _ in 0..max {
            prop_assert!(t.gate.evaluate(&request).is_allowed());
        }
        for _ in 0..extra {
            prop_assert_eq!(t.gate.evaluate(&request).deny_reason(), Some(DenyReason::RateLimited));
        }
        prop_assert_eq!(t.events.len(), max as usize + extra);
    }

    #[test]
    fn budget_restores_after_window(max in 1u32..10, window_ms in 1u64..10_000) {
        let t = test_gate(single_class(max, window_ms));
        let request = RequestDescriptor::new("a", "/");

        for _ in 0..=max {
            t.gate.evaluate(&request);
        }
        prop_assert_eq!(t.gate.evaluate(&request).deny_reason(), Some(DenyReason::RateLimited));

        t.clock.advance(Duration::from_millis(window_ms));
        prop_assert!(t.gate.evaluate(&request).is_allowed());
    }

    #[test]
    fn alphanumeric_paths_are_never_threats(path in "[a-z0-9]{1,32}", query in "[a-z0-9]{0,32}") {
        let t = test_gate(single_class(1000, 60_000));
        let url = format!("/{}?q={}", path, query);

        prop_assert!(t.gate.evaluate(&RequestDescriptor::new("a", url)).is_allowed());
    }

    #[test]
    fn denylisted_identity_is_never_charged(calls in 1usize..30) {
        let t = test_gate(single_class(5, 60_000));
        t.gate.denylist_identity("a", "manual");

        for _ in 0..calls {
            prop_assert_eq!(
                t.gate.evaluate(&RequestDescriptor::new("a", "/")).deny_reason(),
                Some(DenyReason::DenylistedIdentity)
            );
        }
        prop_assert!(t.gate.state().limiter.window("a", "general").is_none());
    }
}
