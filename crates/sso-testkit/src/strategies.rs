//! Property test strategies for the session policy model
//!
//! Addresses and selectors are drawn from small pools so that generated
//! specs regularly contain overlapping policies on the same target, which is
//! where aggregation bugs live.
//!
//! # Example
//!
//! ```rust
//! use sso_testkit::strategies::arb_session_spec;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_spec_is_valid(spec in arb_session_spec()) {
//!         prop_assert!(spec.validate().is_ok());
//!     }
//! }
//! ```

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use crate::fixtures::{base_token, sample_token};
use crate::simulator::SpendAttempt;
use alloy_primitives::{Address, B256, U256};
use sso_core::{
    CallSpec, Condition, Constraint, Selector, SessionSpec, Timestamp, TransferSpec, UsageLimit,
    APPROVE_SELECTOR, TRANSFER_SELECTOR,
};

/// Largest session start generated by [`arb_session_window`]
pub const MAX_START: u64 = 1_000_000;

/// Longest session generated by [`arb_session_window`]
pub const MAX_DURATION: u64 = 500_000;

/// Strategy for addresses from a pool of five, one of them a token fixture
pub fn arb_address() -> impl Strategy<Value = Address> {
    prop_oneof![
        Just(sample_token()),
        (1u8..5).prop_map(Address::with_last_byte),
    ]
}

/// Strategy for selectors: ERC-20 `transfer`/`approve` or an unrecognised one
pub fn arb_selector() -> impl Strategy<Value = Selector> {
    prop_oneof![
        Just(TRANSFER_SELECTOR),
        Just(APPROVE_SELECTOR),
        Just(Selector::from([0x23, 0xb8, 0x72, 0xdd])),
    ]
}

/// Strategy for amounts up to one million
pub fn arb_amount() -> impl Strategy<Value = U256> {
    (0u64..=1_000_000).prop_map(U256::from)
}

/// Strategy for valid usage limits of every kind
pub fn arb_usage_limit() -> impl Strategy<Value = UsageLimit> {
    prop_oneof![
        1 => Just(UsageLimit::UNLIMITED),
        2 => arb_amount().prop_map(UsageLimit::lifetime),
        2 => (arb_amount(), 1u64..200_000).prop_map(|(limit, period)| UsageLimit::Allowance {
            limit,
            period: U256::from(period),
        }),
    ]
}

/// Strategy for usage limits including values near `U256::MAX`
pub fn arb_extreme_usage_limit() -> impl Strategy<Value = UsageLimit> {
    prop_oneof![
        arb_usage_limit(),
        Just(UsageLimit::lifetime(U256::MAX)),
        Just(UsageLimit::Allowance {
            limit: U256::MAX,
            period: U256::from(1u64),
        }),
        Just(UsageLimit::Allowance {
            limit: U256::from(1u64),
            period: U256::MAX,
        }),
    ]
}

/// Strategy for constraint conditions
pub fn arb_condition() -> impl Strategy<Value = Condition> {
    (0u8..7).prop_map(|n| Condition::try_from(n).unwrap())
}

/// Strategy for constraints on argument 0, 1 or 2
pub fn arb_constraint() -> impl Strategy<Value = Constraint> {
    (arb_condition(), 0u64..3, any::<[u8; 32]>(), arb_usage_limit()).prop_map(
        |(condition, index, ref_value, limit)| Constraint {
            condition,
            index,
            ref_value: B256::from(ref_value),
            limit,
        },
    )
}

/// Strategy for call policies with up to three constraints
pub fn arb_call_spec() -> impl Strategy<Value = CallSpec> {
    (
        arb_address(),
        arb_selector(),
        arb_amount(),
        arb_usage_limit(),
        prop::collection::vec(arb_constraint(), 0..4),
    )
        .prop_map(
            |(target, selector, max_value_per_use, value_limit, constraints)| CallSpec {
                target,
                selector,
                max_value_per_use,
                value_limit,
                constraints,
            },
        )
}

/// Strategy for transfer policies
pub fn arb_transfer_spec() -> impl Strategy<Value = TransferSpec> {
    (arb_address(), arb_amount(), arb_usage_limit()).prop_map(
        |(target, max_value_per_use, value_limit)| TransferSpec {
            target,
            max_value_per_use,
            value_limit,
        },
    )
}

/// Strategy for a session start and expiry `(start, expires_at)`
pub fn arb_session_window() -> impl Strategy<Value = (Timestamp, u64)> {
    (0u64..=MAX_START, 0u64..=MAX_DURATION)
        .prop_map(|(start, duration)| (Timestamp::from_secs(start), start + duration))
}

/// Strategy for a session spec expiring at `expires_at`
pub fn arb_session_spec_expiring(expires_at: u64) -> impl Strategy<Value = SessionSpec> {
    (
        arb_address(),
        arb_usage_limit(),
        prop::collection::vec(arb_call_spec(), 0..4),
        prop::collection::vec(arb_transfer_spec(), 0..3),
    )
        .prop_map(
            move |(signer, fee_limit, call_policies, transfer_policies)| SessionSpec {
                signer,
                expires_at: U256::from(expires_at),
                fee_limit,
                call_policies,
                transfer_policies,
            },
        )
}

/// Strategy for valid session specs with arbitrary expiry
pub fn arb_session_spec() -> impl Strategy<Value = SessionSpec> {
    (0u64..=MAX_START + MAX_DURATION).prop_flat_map(arb_session_spec_expiring)
}

/// Strategy for a session window and a spec expiring at its end
pub fn arb_session() -> impl Strategy<Value = (Timestamp, SessionSpec)> {
    arb_session_window().prop_flat_map(|(start, expires_at)| {
        (Just(start), arb_session_spec_expiring(expires_at))
    })
}

/// Strategy for spend attempts aimed at the policies of `spec` between
/// `start` and shortly after its expiry
pub fn arb_spend_attempts(
    spec: &SessionSpec,
    start: Timestamp,
    max_len: usize,
) -> impl Strategy<Value = Vec<SpendAttempt>> {
    let latest = spec
        .expires_at
        .saturating_to::<u64>()
        .saturating_add(10)
        .max(start.as_secs());
    let calls: Vec<(Address, Selector)> = spec
        .call_policies
        .iter()
        .map(|c| (c.target, c.selector))
        .collect();
    let transfers: Vec<Address> = spec.transfer_policies.iter().map(|t| t.target).collect();
    let at = (start.as_secs()..=latest).prop_map(Timestamp::from_secs);

    let fee = (arb_amount(), at.clone()).prop_map(|(amount, at)| SpendAttempt::Fee { amount, at });
    let transfer = (
        prop::sample::select(non_empty(transfers, base_token())),
        arb_amount(),
        at.clone(),
    )
        .prop_map(|(target, value, at)| SpendAttempt::Transfer { target, value, at });
    let call = (
        prop::sample::select(non_empty(calls, (sample_token(), TRANSFER_SELECTOR))),
        arb_amount(),
        prop::collection::vec(arb_amount(), 3),
        at,
    )
        .prop_map(|((target, selector), value, args, at)| SpendAttempt::Call {
            target,
            selector,
            value,
            args,
            at,
        });

    prop::collection::vec(prop_oneof![fee, transfer, call], 0..max_len)
}

fn non_empty<T>(mut items: Vec<T>, fallback: T) -> Vec<T> {
    if items.is_empty() {
        items.push(fallback);
    }
    items
}
