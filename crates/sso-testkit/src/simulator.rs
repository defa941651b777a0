//! Replay spend attempts against a session spec
//!
//! The simulator enforces limits the way the validator does: each limit is
//! consumed cumulatively, allowances refill every `period` seconds, and an
//! attempt only succeeds when every limit it touches has room. Periods are
//! anchored at the session start so that a session of length `d` spans
//! exactly `1 + d / period` windows, the count `max_period_spend` uses. The
//! validator's windows are epoch-aligned instead and can release one more
//! period for a misaligned start. Constraint conditions are not evaluated.

use alloy_primitives::{Address, U256};
use sso_core::{
    LimitState, Selector, SessionSpec, SessionState, Status, Timestamp, TokenCall, UsageLimit,
    DEFAULT_BASE_TOKEN,
};
use std::collections::BTreeMap;

/// One transaction the session key tries to make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendAttempt {
    /// Pay a transaction fee
    Fee {
        /// Fee amount
        amount: U256,
        /// Execution time
        at: Timestamp,
    },
    /// Send native value
    Transfer {
        /// Recipient
        target: Address,
        /// Native value
        value: U256,
        /// Execution time
        at: Timestamp,
    },
    /// Call a contract
    Call {
        /// Contract
        target: Address,
        /// Function selector
        selector: Selector,
        /// Native value sent with the call
        value: U256,
        /// Decoded uint arguments
        args: Vec<U256>,
        /// Execution time
        at: Timestamp,
    },
}

#[derive(Debug, Clone)]
struct LimitTracker {
    limit: UsageLimit,
    used: BTreeMap<U256, U256>,
}

impl LimitTracker {
    fn new(limit: UsageLimit) -> Self {
        Self {
            limit,
            used: BTreeMap::new(),
        }
    }

    fn window(&self, elapsed: U256) -> U256 {
        match self.limit {
            UsageLimit::Allowance { period, .. } if !period.is_zero() => elapsed / period,
            _ => U256::ZERO,
        }
    }

    fn has_room(&self, amount: U256, elapsed: U256) -> bool {
        match self.limit {
            UsageLimit::Unlimited { .. } => true,
            UsageLimit::Lifetime { limit, .. } | UsageLimit::Allowance { limit, .. } => {
                let used = self
                    .used
                    .get(&self.window(elapsed))
                    .copied()
                    .unwrap_or_default();
                used.checked_add(amount).is_some_and(|total| total <= limit)
            }
        }
    }

    fn consume(&mut self, amount: U256, elapsed: U256) {
        let window = self.window(elapsed);
        let entry = self.used.entry(window).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Remaining amount as the validator reports it: lifetime limits count
    /// everything, allowances only the latest window, unlimited reports zero.
    fn remaining(&self) -> U256 {
        match self.limit {
            UsageLimit::Unlimited { .. } => U256::ZERO,
            UsageLimit::Lifetime { limit, .. } | UsageLimit::Allowance { limit, .. } => {
                let used = self
                    .used
                    .last_key_value()
                    .map(|(_, used)| *used)
                    .unwrap_or_default();
                limit.saturating_sub(used)
            }
        }
    }
}

/// Validator-like limit bookkeeping for one session
#[derive(Debug, Clone)]
pub struct SessionSimulator<'a> {
    spec: &'a SessionSpec,
    start: Timestamp,
    base_token: Address,
    fee: LimitTracker,
    transfer_value: Vec<LimitTracker>,
    call_value: Vec<LimitTracker>,
    call_params: Vec<Vec<LimitTracker>>,
    moved: BTreeMap<Address, U256>,
}

impl<'a> SessionSimulator<'a> {
    /// Start a session at `start`, accounting native value under the default base token
    pub fn new(spec: &'a SessionSpec, start: Timestamp) -> Self {
        Self::with_base_token(spec, start, DEFAULT_BASE_TOKEN)
    }

    /// Start a session with an explicit base token address
    pub fn with_base_token(spec: &'a SessionSpec, start: Timestamp, base_token: Address) -> Self {
        Self {
            spec,
            start,
            base_token,
            fee: LimitTracker::new(spec.fee_limit),
            transfer_value: spec
                .transfer_policies
                .iter()
                .map(|t| LimitTracker::new(t.value_limit))
                .collect(),
            call_value: spec
                .call_policies
                .iter()
                .map(|c| LimitTracker::new(c.value_limit))
                .collect(),
            call_params: spec
                .call_policies
                .iter()
                .map(|c| c.constraints.iter().map(|k| LimitTracker::new(k.limit)).collect())
                .collect(),
            moved: BTreeMap::new(),
        }
    }

    /// Apply an attempt, returning whether the validator would accept it
    pub fn apply(&mut self, attempt: &SpendAttempt) -> bool {
        let at = match attempt {
            SpendAttempt::Fee { at, .. }
            | SpendAttempt::Transfer { at, .. }
            | SpendAttempt::Call { at, .. } => *at,
        };
        if at < self.start || self.spec.is_expired_at(at) {
            return false;
        }
        let elapsed = U256::from(at.as_secs() - self.start.as_secs());

        match attempt {
            SpendAttempt::Fee { amount, .. } => {
                if !self.fee.has_room(*amount, elapsed) {
                    return false;
                }
                self.fee.consume(*amount, elapsed);
                self.record(self.base_token, *amount);
                true
            }
            SpendAttempt::Transfer { target, value, .. } => {
                let Some(i) = self
                    .spec
                    .transfer_policies
                    .iter()
                    .position(|t| t.target == *target)
                else {
                    return false;
                };
                let policy = &self.spec.transfer_policies[i];
                if *value > policy.max_value_per_use
                    || !self.transfer_value[i].has_room(*value, elapsed)
                {
                    return false;
                }
                self.transfer_value[i].consume(*value, elapsed);
                self.record(self.base_token, *value);
                true
            }
            SpendAttempt::Call {
                target,
                selector,
                value,
                args,
                ..
            } => {
                let Some(i) = self
                    .spec
                    .call_policies
                    .iter()
                    .position(|c| c.target == *target && c.selector == *selector)
                else {
                    return false;
                };
                let policy = &self.spec.call_policies[i];
                if *value > policy.max_value_per_use || !self.call_value[i].has_room(*value, elapsed)
                {
                    return false;
                }
                let mut arg_amounts = Vec::with_capacity(policy.constraints.len());
                for (j, constraint) in policy.constraints.iter().enumerate() {
                    let Some(arg) = usize::try_from(constraint.index)
                        .ok()
                        .and_then(|idx| args.get(idx))
                    else {
                        return false;
                    };
                    if !self.call_params[i][j].has_room(*arg, elapsed) {
                        return false;
                    }
                    arg_amounts.push(*arg);
                }

                self.call_value[i].consume(*value, elapsed);
                for (j, arg) in arg_amounts.into_iter().enumerate() {
                    self.call_params[i][j].consume(arg, elapsed);
                }
                self.record(self.base_token, *value);
                if let Some(call) = TokenCall::from_selector(selector) {
                    let amount = usize::try_from(call.amount_index())
                        .ok()
                        .and_then(|idx| args.get(idx))
                        .copied()
                        .unwrap_or_default();
                    self.record(*target, amount);
                }
                true
            }
        }
    }

    /// Apply every attempt in order, returning how many were accepted
    pub fn apply_all<'b>(&mut self, attempts: impl IntoIterator<Item = &'b SpendAttempt>) -> usize {
        attempts
            .into_iter()
            .filter(|attempt| self.apply(attempt))
            .count()
    }

    /// Total accepted movement of each token
    pub fn moved(&self) -> &BTreeMap<Address, U256> {
        &self.moved
    }

    /// Total accepted movement of one token
    pub fn moved_of(&self, token: &Address) -> U256 {
        self.moved.get(token).copied().unwrap_or_default()
    }

    /// Session state the validator would report after the accepted attempts
    pub fn state(&self) -> SessionState {
        let entry = |tracker: &LimitTracker, target: Address, selector: Selector, index: u64| {
            LimitState {
                remaining: tracker.remaining(),
                target,
                selector,
                index: U256::from(index),
            }
        };
        SessionState {
            status: Status::Active,
            fees_remaining: self.fee.remaining(),
            transfer_value: self
                .spec
                .transfer_policies
                .iter()
                .zip(&self.transfer_value)
                .map(|(t, tracker)| entry(tracker, t.target, Selector::ZERO, 0))
                .collect(),
            call_value: self
                .spec
                .call_policies
                .iter()
                .zip(&self.call_value)
                .map(|(c, tracker)| entry(tracker, c.target, c.selector, 0))
                .collect(),
            call_params: self
                .spec
                .call_policies
                .iter()
                .zip(&self.call_params)
                .flat_map(|(c, trackers)| {
                    c.constraints
                        .iter()
                        .zip(trackers)
                        .map(move |(k, tracker)| entry(tracker, c.target, c.selector, k.index))
                })
                .collect(),
        }
    }

    fn record(&mut self, token: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let entry = self.moved.entry(token).or_default();
        *entry = entry.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_recipient, sample_signer, sample_token, u, SessionSpecBuilder};
    use sso_core::TRANSFER_SELECTOR;

    #[test]
    fn test_allowance_refills_each_period() {
        let spec = SessionSpecBuilder::new(sample_signer())
            .expires_at(1_000 + 250)
            .fee_limit(UsageLimit::allowance(u(10), u(100)).unwrap())
            .build();
        let mut sim = SessionSimulator::new(&spec, Timestamp::from_secs(1_000));
        let fee = |amount, at| SpendAttempt::Fee {
            amount: u(amount),
            at: Timestamp::from_secs(at),
        };

        assert!(sim.apply(&fee(10, 1_000)));
        assert!(!sim.apply(&fee(1, 1_099)));
        assert!(sim.apply(&fee(10, 1_100)));
        assert!(sim.apply(&fee(10, 1_250)));
        assert!(!sim.apply(&fee(1, 1_251)));
        assert_eq!(sim.moved_of(&crate::base_token()), u(30));
    }

    #[test]
    fn test_token_transfer_tracks_amount() {
        let spec = SessionSpecBuilder::new(sample_signer())
            .expires_at(10)
            .erc20_transfer(sample_token(), UsageLimit::lifetime(u(100)))
            .transfer(sample_recipient(), UsageLimit::lifetime(u(5)))
            .build();
        let mut sim = SessionSimulator::new(&spec, Timestamp::EPOCH);
        let call = |amount| SpendAttempt::Call {
            target: sample_token(),
            selector: TRANSFER_SELECTOR,
            value: U256::ZERO,
            args: vec![U256::ZERO, u(amount)],
            at: Timestamp::from_secs(1),
        };

        assert_eq!(sim.apply_all(&[call(60), call(50), call(40)]), 2);
        assert_eq!(sim.moved_of(&sample_token()), u(100));
        assert!(!sim.apply(&SpendAttempt::Transfer {
            target: sample_recipient(),
            value: u(6),
            at: Timestamp::from_secs(1),
        }));
    }
}
