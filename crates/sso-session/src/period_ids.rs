//! Period ids for a session transaction
//!
//! A session transaction carries one period id per limit it touches so the
//! validator knows which allowance window to charge: the fee limit first,
//! then the matched policy's value limit, then each constraint of a matched
//! call policy in declaration order.

use alloy_primitives::{Address, U256};
use sso_core::{Policy, Selector, SessionSpec, SsoError, SsoResult, Timestamp, UsageLimit};

/// Allowance window containing `at`; 0 for limits without periods
pub fn period_id(limit: &UsageLimit, at: Timestamp) -> u64 {
    match limit {
        UsageLimit::Allowance { period, .. } if !period.is_zero() => {
            let id = at.to_u256() / *period;
            // quotient never exceeds `at`, so it fits
            id.saturating_to::<u64>()
        }
        _ => 0,
    }
}

/// First policy a transaction to `target` falls under.
///
/// A selector means a contract call and only call policies with the same
/// target and selector match; otherwise only transfer policies match.
pub fn find_policy<'a>(
    spec: &'a SessionSpec,
    target: Address,
    selector: Option<Selector>,
) -> Option<Policy<'a>> {
    match selector {
        Some(selector) => spec
            .call_policies
            .iter()
            .find(|c| c.target == target && c.selector == selector)
            .map(Policy::Call),
        None => spec
            .transfer_policies
            .iter()
            .find(|t| t.target == target)
            .map(Policy::Transfer),
    }
}

/// Period ids for a transaction to `target` executed at `at`
pub fn period_ids_for_transaction(
    spec: &SessionSpec,
    target: Address,
    selector: Option<Selector>,
    at: Timestamp,
) -> SsoResult<Vec<u64>> {
    let policy = find_policy(spec, target, selector).ok_or_else(|| {
        SsoError::not_found(format!(
            "transaction to {target} (selector {}) does not fit any policy",
            selector.map_or_else(|| "none".to_string(), |s| s.to_string())
        ))
    })?;

    let mut ids = Vec::with_capacity(2 + policy.constraints().len());
    ids.push(period_id(&spec.fee_limit, at));
    ids.push(period_id(policy.value_limit(), at));
    ids.extend(policy.constraints().iter().map(|c| period_id(&c.limit, at)));
    tracing::trace!(%target, ?ids, "period ids for transaction");
    Ok(ids)
}
