//! Policy targets a session must not reach
//!
//! A policy that lets the session key call the account itself or one of the
//! SSO system contracts (factory, validators, paymaster) is flagged so the
//! caller can refuse to create the session.

use alloy_primitives::Address;
use serde::Serialize;
use sso_core::{Selector, SessionSpec};

/// Why a target is off limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProhibitedReason {
    /// The smart account the session belongs to
    Account,
    /// A system contract of the deployment
    SystemContract,
}

/// Policy whose target is off limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProhibitedTarget {
    /// Policy target
    pub target: Address,
    /// Selector of a call policy, `None` for transfers
    pub selector: Option<Selector>,
    /// Which rule it breaks
    pub reason: ProhibitedReason,
}

/// Why `target` is off limits for a session on `account`, if it is
pub fn check_target(
    target: Address,
    account: Address,
    system_contracts: &[Address],
) -> Option<ProhibitedReason> {
    if target == account {
        Some(ProhibitedReason::Account)
    } else if system_contracts.contains(&target) {
        Some(ProhibitedReason::SystemContract)
    } else {
        None
    }
}

/// Every policy of `spec` aimed at the account or a system contract.
///
/// Transfers come first, then call policies, each in declaration order.
pub fn prohibited_targets(
    spec: &SessionSpec,
    account: Address,
    system_contracts: &[Address],
) -> Vec<ProhibitedTarget> {
    let found: Vec<_> = spec
        .policies()
        .filter_map(|policy| {
            let target = policy.target();
            check_target(target, account, system_contracts).map(|reason| ProhibitedTarget {
                target,
                selector: policy.as_call_policy().map(|c| c.selector),
                reason,
            })
        })
        .collect();
    if !found.is_empty() {
        tracing::warn!(%account, count = found.len(), "session policies reach prohibited targets");
    }
    found
}
