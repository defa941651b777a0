//! Call and transfer policies

use crate::constraint::Constraint;
use crate::errors::SsoResult;
use crate::limit::UsageLimit;
use crate::serialization::decimal_u256;
use alloy_primitives::{Address, FixedBytes, U256};
use serde::{Deserialize, Serialize};

/// Four-byte function selector
pub type Selector = FixedBytes<4>;

/// Permission to call one function on one contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CallSpec {
    /// Contract being called
    pub target: Address,
    /// Function selector
    pub selector: Selector,
    /// Native value cap per call
    #[serde(with = "decimal_u256")]
    pub max_value_per_use: U256,
    /// Cumulative native value cap
    pub value_limit: UsageLimit,
    /// Argument constraints, in declaration order
    pub constraints: Vec<Constraint>,
}

impl CallSpec {
    /// Check the value limit and every constraint limit
    pub fn validate(&self) -> SsoResult<()> {
        self.value_limit.validate()?;
        self.constraints.iter().try_for_each(Constraint::validate)
    }
}

/// Permission to send native value to one address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferSpec {
    /// Recipient
    pub target: Address,
    /// Native value cap per transfer
    #[serde(with = "decimal_u256")]
    pub max_value_per_use: U256,
    /// Cumulative native value cap
    pub value_limit: UsageLimit,
}

impl TransferSpec {
    /// Check the value limit
    pub fn validate(&self) -> SsoResult<()> {
        self.value_limit.validate()
    }
}

/// Borrowed view over either kind of policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy<'a> {
    /// Plain value transfer
    Transfer(&'a TransferSpec),
    /// Contract call
    Call(&'a CallSpec),
}

impl<'a> Policy<'a> {
    /// Address the policy applies to
    pub fn target(&self) -> Address {
        match *self {
            Self::Transfer(t) => t.target,
            Self::Call(c) => c.target,
        }
    }

    /// Cumulative native value cap
    pub fn value_limit(&self) -> &'a UsageLimit {
        match *self {
            Self::Transfer(t) => &t.value_limit,
            Self::Call(c) => &c.value_limit,
        }
    }

    /// Native value cap per use
    pub fn max_value_per_use(&self) -> U256 {
        match *self {
            Self::Transfer(t) => t.max_value_per_use,
            Self::Call(c) => c.max_value_per_use,
        }
    }

    /// The call policy, if this is one
    pub fn as_call_policy(&self) -> Option<&'a CallSpec> {
        match *self {
            Self::Call(c) => Some(c),
            Self::Transfer(_) => None,
        }
    }

    /// Constraints of a call policy, empty for transfers
    pub fn constraints(&self) -> &'a [Constraint] {
        match *self {
            Self::Call(c) => &c.constraints,
            Self::Transfer(_) => &[],
        }
    }
}

impl<'a> From<&'a CallSpec> for Policy<'a> {
    fn from(spec: &'a CallSpec) -> Self {
        Self::Call(spec)
    }
}

impl<'a> From<&'a TransferSpec> for Policy<'a> {
    fn from(spec: &'a TransferSpec) -> Self {
        Self::Transfer(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, fixed_bytes};

    #[test]
    fn test_policy_view() {
        let call = CallSpec {
            target: address!("1111111111111111111111111111111111111111"),
            selector: fixed_bytes!("a9059cbb"),
            max_value_per_use: U256::ZERO,
            value_limit: UsageLimit::ZERO,
            constraints: vec![Constraint::limit_only(1, UsageLimit::lifetime(U256::from(9u64)))],
        };
        let policy = Policy::from(&call);
        assert_eq!(policy.target(), call.target);
        assert_eq!(policy.constraints().len(), 1);
        assert!(policy.as_call_policy().is_some());

        let transfer = TransferSpec {
            target: Address::ZERO,
            max_value_per_use: U256::from(1u64),
            value_limit: UsageLimit::UNLIMITED,
        };
        let policy = Policy::from(&transfer);
        assert!(policy.as_call_policy().is_none());
        assert!(policy.constraints().is_empty());
        assert!(policy.value_limit().is_unlimited());
    }

    #[test]
    fn test_call_validate_reaches_constraints() {
        let call = CallSpec {
            target: Address::ZERO,
            selector: Selector::ZERO,
            max_value_per_use: U256::ZERO,
            value_limit: UsageLimit::ZERO,
            constraints: vec![Constraint::limit_only(
                0,
                UsageLimit::Allowance {
                    limit: U256::from(1u64),
                    period: U256::ZERO,
                },
            )],
        };
        assert!(call.validate().unwrap_err().is_invalid_config());
    }
}
