//! Call argument constraints

use crate::errors::{SsoError, SsoResult};
use crate::limit::UsageLimit;
use crate::serialization::decimal_u64;
use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Comparison applied on-chain between a call argument and `ref_value`.
///
/// The engine carries the condition through hashing and encoding but never
/// evaluates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Condition {
    /// No comparison
    #[default]
    Unconstrained = 0,
    /// `arg == ref`
    Equal = 1,
    /// `arg > ref`
    Greater = 2,
    /// `arg < ref`
    Less = 3,
    /// `arg >= ref`
    GreaterEqual = 4,
    /// `arg <= ref`
    LessEqual = 5,
    /// `arg != ref`
    NotEqual = 6,
}

const CONDITIONS: [Condition; 7] = [
    Condition::Unconstrained,
    Condition::Equal,
    Condition::Greater,
    Condition::Less,
    Condition::GreaterEqual,
    Condition::LessEqual,
    Condition::NotEqual,
];

impl Condition {
    /// Variant name used in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconstrained => "Unconstrained",
            Self::Equal => "Equal",
            Self::Greater => "Greater",
            Self::Less => "Less",
            Self::GreaterEqual => "GreaterEqual",
            Self::LessEqual => "LessEqual",
            Self::NotEqual => "NotEqual",
        }
    }
}

impl From<Condition> for u8 {
    fn from(value: Condition) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Condition {
    type Error = SsoError;

    fn try_from(value: u8) -> SsoResult<Self> {
        CONDITIONS
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| {
                SsoError::serialization(format!("unknown condition discriminant {value}"))
            })
    }
}

impl FromStr for Condition {
    type Err = SsoError;

    fn from_str(s: &str) -> SsoResult<Self> {
        CONDITIONS
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| SsoError::serialization(format!("unknown condition {s:?}")))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::serialization::deserialize_wire_enum(deserializer)
    }
}

/// Restriction on one argument of an encoded call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Constraint {
    /// Comparison against `ref_value`
    pub condition: Condition,
    /// Argument position in the decoded call
    #[serde(with = "decimal_u64")]
    pub index: u64,
    /// Comparison operand
    pub ref_value: B256,
    /// Cumulative cap on the argument's value
    pub limit: UsageLimit,
}

impl Constraint {
    /// Constraint that only caps the argument at `index`
    pub fn limit_only(index: u64, limit: UsageLimit) -> Self {
        Self {
            condition: Condition::Unconstrained,
            index,
            ref_value: B256::ZERO,
            limit,
        }
    }

    /// Check the nested limit
    pub fn validate(&self) -> SsoResult<()> {
        self.limit.validate()
    }
}
