//! Session specification
//!
//! A `SessionSpec` is the complete, immutable description of what a session
//! key may do. Once hashed and submitted it must not change: the on-chain
//! validator identifies the session by the hash of exactly these fields.

use crate::errors::{SsoError, SsoResult};
use crate::limit::UsageLimit;
use crate::policy::{CallSpec, Policy, TransferSpec};
use crate::serialization::decimal_u256;
use crate::time::Timestamp;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Complete description of a session key's permissions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionSpec {
    /// Session key address
    pub signer: Address,
    /// Expiry in unix seconds; the session is invalid after this instant
    #[serde(with = "decimal_u256")]
    pub expires_at: U256,
    /// Cap on fees paid by the session
    pub fee_limit: UsageLimit,
    /// Permitted contract calls
    pub call_policies: Vec<CallSpec>,
    /// Permitted value transfers
    pub transfer_policies: Vec<TransferSpec>,
}

impl SessionSpec {
    /// Check every limit in the spec.
    pub fn validate(&self) -> SsoResult<()> {
        self.fee_limit.validate()?;
        self.call_policies.iter().try_for_each(CallSpec::validate)?;
        self.transfer_policies
            .iter()
            .try_for_each(TransferSpec::validate)
    }

    /// Check that the spec can be submitted at `now`: all limits valid and
    /// expiry not already in the past.
    pub fn validate_for_submission(&self, now: Timestamp) -> SsoResult<()> {
        self.validate()?;
        if self.expires_at < now.to_u256() {
            return Err(SsoError::invalid_config(format!(
                "session expired at {} before submission at {}",
                self.expires_at,
                now.as_secs()
            )));
        }
        Ok(())
    }

    /// True once `now` is past `expires_at`
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now.to_u256() > self.expires_at
    }

    /// All policies, transfers first, in declaration order
    pub fn policies(&self) -> impl Iterator<Item = Policy<'_>> {
        self.transfer_policies
            .iter()
            .map(Policy::Transfer)
            .chain(self.call_policies.iter().map(Policy::Call))
    }

    /// Total number of call constraints across all call policies
    pub fn constraint_count(&self) -> usize {
        self.call_policies.iter().map(|c| c.constraints.len()).sum()
    }
}
