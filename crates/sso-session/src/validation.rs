//! Predicates over session state
//!
//! Used after a transaction to assert what the validator recorded, e.g. that
//! a session is active and a transfer consumed exactly the expected amount.

use alloy_primitives::U256;
use sso_core::{LimitState, SessionState, SsoError, SsoResult, Status};
use std::fmt;

/// Comparison between an observed and an expected amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `actual == expected`
    Eq,
    /// `actual < expected`
    Lt,
    /// `actual <= expected`
    Le,
    /// `actual > expected`
    Gt,
    /// `actual >= expected`
    Ge,
}

impl Comparison {
    /// Whether `actual` relates to `expected` as required
    pub fn holds(&self, actual: U256, expected: U256) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Lt => actual < expected,
            Self::Le => actual <= expected,
            Self::Gt => actual > expected,
            Self::Ge => actual >= expected,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        })
    }
}

/// One expectation about a session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateCheck {
    /// Status is `Active`
    Active,
    /// Status is `Closed`
    Closed,
    /// Status equals the given value
    Status(Status),
    /// Fee allowance remaining
    FeesRemaining(Comparison, U256),
    /// `transfer_value[index].remaining`
    TransferRemaining {
        /// Entry position
        index: usize,
        /// Comparison to apply
        cmp: Comparison,
        /// Expected amount
        value: U256,
    },
    /// `call_value[index].remaining`
    CallValueRemaining {
        /// Entry position
        index: usize,
        /// Comparison to apply
        cmp: Comparison,
        /// Expected amount
        value: U256,
    },
    /// `call_params[index].remaining`
    CallParamRemaining {
        /// Entry position
        index: usize,
        /// Comparison to apply
        cmp: Comparison,
        /// Expected amount
        value: U256,
    },
}

impl StateCheck {
    /// Evaluate against `state`
    pub fn evaluate(&self, state: &SessionState) -> SsoResult<()> {
        match self {
            Self::Active => expect_status(state, Status::Active),
            Self::Closed => expect_status(state, Status::Closed),
            Self::Status(status) => expect_status(state, *status),
            Self::FeesRemaining(cmp, value) => {
                compare("feesRemaining", state.fees_remaining, *cmp, *value)
            }
            Self::TransferRemaining { index, cmp, value } => {
                entry_remaining("transferValue", &state.transfer_value, *index, *cmp, *value)
            }
            Self::CallValueRemaining { index, cmp, value } => {
                entry_remaining("callValue", &state.call_value, *index, *cmp, *value)
            }
            Self::CallParamRemaining { index, cmp, value } => {
                entry_remaining("callParams", &state.call_params, *index, *cmp, *value)
            }
        }
    }
}

fn expect_status(state: &SessionState, expected: Status) -> SsoResult<()> {
    if state.status == expected {
        Ok(())
    } else {
        Err(SsoError::state_check(
            "status",
            format!("expected {expected}, found {}", state.status),
        ))
    }
}

fn compare(field: &str, actual: U256, cmp: Comparison, expected: U256) -> SsoResult<()> {
    if cmp.holds(actual, expected) {
        Ok(())
    } else {
        Err(SsoError::state_check(
            field,
            format!("expected {cmp} {expected}, found {actual}"),
        ))
    }
}

fn entry_remaining(
    list: &str,
    entries: &[LimitState],
    index: usize,
    cmp: Comparison,
    expected: U256,
) -> SsoResult<()> {
    let field = format!("{list}[{index}].remaining");
    let entry = entries.get(index).ok_or_else(|| {
        SsoError::state_check(
            field.as_str(),
            format!("no entry (list has {})", entries.len()),
        )
    })?;
    compare(&field, entry.remaining, cmp, expected)
}

/// Evaluate every check in order, failing on the first that does not hold
pub fn verify_state(state: &SessionState, checks: &[StateCheck]) -> SsoResult<()> {
    checks.iter().try_for_each(|check| check.evaluate(state))
}
