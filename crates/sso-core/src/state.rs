//! On-chain session state snapshot
//!
//! Read-only. Lists are index-aligned with the spec that produced them:
//! `transfer_value[i]` tracks `transfer_policies[i]`, `call_value[i]` tracks
//! `call_policies[i]`, and `call_params` is flat across every call policy's
//! constraints in declaration order.

use crate::errors::{SsoError, SsoResult};
use crate::policy::Selector;
use crate::serialization::decimal_u256;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Session status as stored by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Status {
    /// Never created
    #[default]
    NotInitialized = 0,
    /// Created and not revoked
    Active = 1,
    /// Revoked
    Closed = 2,
}

impl Status {
    /// Variant name used in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NotInitialized",
            Self::Active => "Active",
            Self::Closed => "Closed",
        }
    }

    /// True for `Active`
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// True for `Closed`
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// True for `NotInitialized`
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = SsoError;

    fn try_from(value: u8) -> SsoResult<Self> {
        match value {
            0 => Ok(Self::NotInitialized),
            1 => Ok(Self::Active),
            2 => Ok(Self::Closed),
            other => Err(SsoError::serialization(format!(
                "unknown status discriminant {other}"
            ))),
        }
    }
}

impl FromStr for Status {
    type Err = SsoError;

    fn from_str(s: &str) -> SsoResult<Self> {
        match s {
            "NotInitialized" => Ok(Self::NotInitialized),
            "Active" => Ok(Self::Active),
            "Closed" => Ok(Self::Closed),
            other => Err(SsoError::serialization(format!("unknown status {other:?}"))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::serialization::deserialize_wire_enum(deserializer)
    }
}

/// Remaining balance of one tracked limit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LimitState {
    /// Amount still available
    #[serde(with = "decimal_u256")]
    pub remaining: U256,
    /// Policy target
    pub target: Address,
    /// Policy selector, zero for transfers
    pub selector: Selector,
    /// Constraint argument index, zero for value limits
    #[serde(with = "decimal_u256")]
    pub index: U256,
}

/// Snapshot of a session as seen by the validator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionState {
    /// Session status
    pub status: Status,
    /// Fee allowance still available
    #[serde(with = "decimal_u256")]
    pub fees_remaining: U256,
    /// One entry per transfer policy
    pub transfer_value: Vec<LimitState>,
    /// One entry per call policy
    pub call_value: Vec<LimitState>,
    /// One entry per call constraint, flat across call policies
    pub call_params: Vec<LimitState>,
}
