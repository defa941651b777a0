//! Session state reconciler
//!
//! Replays the validator's bookkeeping backwards: for every lifetime limit
//! the amount consumed so far is `limit - remaining`, attributed to the base
//! token (fees and native value) or to the ERC-20 contract a `transfer` /
//! `approve` policy targets. Every lifetime constraint of such a policy
//! counts, whichever argument it meters, so two constraints on one argument
//! add up.
//!
//! State lists are matched to the spec by position. `call_params` is one flat
//! list across every call policy, consumed in declaration order. Entries that
//! are missing are skipped; entries that disagree with the spec are reported
//! but never abort the walk.
//!
//! Allowance limits are not reconciled: the validator only exposes the
//! remaining amount of the current period.

use alloy_primitives::{Address, U256};
use serde::Serialize;
use sso_core::{
    EngineConfig, LimitState, Selector, SessionSpec, SessionState, TokenCall, UsageLimit,
};
use std::collections::BTreeMap;

/// Amount consumed per token
pub type SpentMap = BTreeMap<Address, U256>;

/// Which limit of the spec a state entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum LimitSource {
    /// `fee_limit`
    Fee,
    /// `transfer_policies[policy].value_limit`
    TransferValue {
        /// Transfer policy position
        policy: usize,
    },
    /// `call_policies[policy].value_limit`
    CallValue {
        /// Call policy position
        policy: usize,
    },
    /// `call_policies[policy].constraints[constraint].limit`
    CallParam {
        /// Call policy position
        policy: usize,
        /// Constraint position within the policy
        constraint: usize,
        /// Position in the flat `call_params` list
        entry: usize,
    },
}

/// State list named in an [`Mismatch::ExtraEntries`] report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StateList {
    /// `transfer_value`
    TransferValue,
    /// `call_value`
    CallValue,
    /// `call_params`
    CallParams,
}

/// Disagreement between a state snapshot and the spec it was read for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Mismatch {
    /// Entry target differs from the policy target
    Target {
        /// Limit the entry was matched to
        source: LimitSource,
        /// Policy target
        expected: Address,
        /// Entry target
        actual: Address,
    },
    /// Entry selector differs from the call policy selector
    Selector {
        /// Limit the entry was matched to
        source: LimitSource,
        /// Policy selector
        expected: Selector,
        /// Entry selector
        actual: Selector,
    },
    /// Entry argument index differs from the constraint index
    Index {
        /// Limit the entry was matched to
        source: LimitSource,
        /// Constraint index
        expected: u64,
        /// Entry index
        actual: U256,
    },
    /// More remains than the limit ever allowed
    RemainingExceedsLimit {
        /// Limit the entry was matched to
        source: LimitSource,
        /// Declared limit
        limit: U256,
        /// Reported remaining amount
        remaining: U256,
    },
    /// State list longer than the spec
    ExtraEntries {
        /// Offending list
        list: StateList,
        /// Entries the spec accounts for
        expected: usize,
        /// Entries present
        actual: usize,
    },
}

/// Result of reconciling a spec against its state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Consumed amount per token
    pub spent: SpentMap,
    /// Lifetime limits with no state entry
    pub skipped: Vec<LimitSource>,
    /// Inconsistencies found along the way
    pub mismatches: Vec<Mismatch>,
}

impl Reconciliation {
    /// True when the state agreed with the spec everywhere
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn add_spend(&mut self, token: Address, amount: U256) {
        let entry = self.spent.entry(token).or_insert(U256::ZERO);
        *entry = entry.checked_add(amount).unwrap_or_else(|| {
            tracing::warn!(%token, "spent total overflows 256 bits; saturating");
            U256::MAX
        });
    }

    fn consumed(&mut self, source: LimitSource, limit: U256, remaining: U256) -> U256 {
        limit.checked_sub(remaining).unwrap_or_else(|| {
            tracing::warn!(?source, %limit, %remaining, "remaining exceeds limit; stale state?");
            self.mismatches.push(Mismatch::RemainingExceedsLimit {
                source,
                limit,
                remaining,
            });
            U256::ZERO
        })
    }

    fn check_target(&mut self, source: LimitSource, expected: Address, entry: &LimitState) {
        if entry.target != expected {
            tracing::debug!(?source, %expected, actual = %entry.target, "state target mismatch");
            self.mismatches.push(Mismatch::Target {
                source,
                expected,
                actual: entry.target,
            });
        }
    }

    fn check_selector(&mut self, source: LimitSource, expected: Selector, entry: &LimitState) {
        if entry.selector != expected {
            tracing::debug!(?source, %expected, actual = %entry.selector, "state selector mismatch");
            self.mismatches.push(Mismatch::Selector {
                source,
                expected,
                actual: entry.selector,
            });
        }
    }

    fn check_extra(&mut self, list: StateList, expected: usize, actual: usize) {
        if actual > expected {
            tracing::debug!(?list, expected, actual, "state has entries the spec does not declare");
            self.mismatches.push(Mismatch::ExtraEntries {
                list,
                expected,
                actual,
            });
        }
    }

    fn skip(&mut self, source: LimitSource) {
        tracing::debug!(?source, "no state entry for lifetime limit; skipping");
        self.skipped.push(source);
    }
}

/// Reconciles session state against specs
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    config: &'a EngineConfig,
}

impl<'a> Reconciler<'a> {
    /// Reconciler accounting native value under `config.base_token`
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Walk `spec` and `state` together and compute consumption per token
    pub fn reconcile(&self, spec: &SessionSpec, state: &SessionState) -> Reconciliation {
        let base = self.config.base_token;
        let mut out = Reconciliation::default();

        if let UsageLimit::Lifetime { limit, .. } = spec.fee_limit {
            let spent = out.consumed(LimitSource::Fee, limit, state.fees_remaining);
            out.add_spend(base, spent);
        }

        for (i, policy) in spec.transfer_policies.iter().enumerate() {
            let source = LimitSource::TransferValue { policy: i };
            let entry = state.transfer_value.get(i);
            if let Some(entry) = entry {
                out.check_target(source, policy.target, entry);
            }
            if let UsageLimit::Lifetime { limit, .. } = policy.value_limit {
                match entry {
                    Some(entry) => {
                        let spent = out.consumed(source, limit, entry.remaining);
                        out.add_spend(base, spent);
                    }
                    None => out.skip(source),
                }
            }
        }
        out.check_extra(
            StateList::TransferValue,
            spec.transfer_policies.len(),
            state.transfer_value.len(),
        );

        for (i, policy) in spec.call_policies.iter().enumerate() {
            let source = LimitSource::CallValue { policy: i };
            let entry = state.call_value.get(i);
            if let Some(entry) = entry {
                out.check_target(source, policy.target, entry);
                out.check_selector(source, policy.selector, entry);
            }
            if let UsageLimit::Lifetime { limit, .. } = policy.value_limit {
                match entry {
                    Some(entry) => {
                        let spent = out.consumed(source, limit, entry.remaining);
                        out.add_spend(base, spent);
                    }
                    None => out.skip(source),
                }
            }
        }
        out.check_extra(
            StateList::CallValue,
            spec.call_policies.len(),
            state.call_value.len(),
        );

        let mut cursor = 0usize;
        for (i, policy) in spec.call_policies.iter().enumerate() {
            let meters_token = TokenCall::from_selector(&policy.selector).is_some();

            for (j, constraint) in policy.constraints.iter().enumerate() {
                let source = LimitSource::CallParam {
                    policy: i,
                    constraint: j,
                    entry: cursor,
                };
                let entry = state.call_params.get(cursor);
                cursor += 1;

                if let Some(entry) = entry {
                    out.check_target(source, policy.target, entry);
                    out.check_selector(source, policy.selector, entry);
                    if entry.index != U256::from(constraint.index) {
                        out.mismatches.push(Mismatch::Index {
                            source,
                            expected: constraint.index,
                            actual: entry.index,
                        });
                    }
                }

                if !meters_token {
                    continue;
                }
                let UsageLimit::Lifetime { limit, .. } = constraint.limit else {
                    continue;
                };
                match entry {
                    Some(entry) => {
                        let spent = out.consumed(source, limit, entry.remaining);
                        out.add_spend(policy.target, spent);
                    }
                    None => out.skip(source),
                }
            }
        }
        out.check_extra(StateList::CallParams, cursor, state.call_params.len());

        if !out.is_consistent() {
            tracing::warn!(
                signer = %spec.signer,
                mismatches = out.mismatches.len(),
                "session state disagrees with spec"
            );
        }
        out
    }
}

/// Reconcile with the default engine configuration
pub fn reconcile(spec: &SessionSpec, state: &SessionState) -> Reconciliation {
    let config = EngineConfig::default();
    Reconciler::new(&config).reconcile(spec, state)
}

/// Consumed amount per token under the default engine configuration
pub fn spent_by_token(spec: &SessionSpec, state: &SessionState) -> SpentMap {
    reconcile(spec, state).spent
}
