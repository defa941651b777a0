//! Usage limits
//!
//! A usage limit bounds cumulative consumption of one resource (fees, native
//! value, or one call argument). The model is a closed sum type; the wire and
//! ABI shape `{ limitType, limit, period }` is only used at the boundary and
//! is converted through [`UsageLimitParts`].

use crate::errors::{SsoError, SsoResult};
use crate::serialization::decimal_u256;
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// On-chain limit discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LimitType {
    /// No cap
    Unlimited = 0,
    /// One cap for the whole session
    Lifetime = 1,
    /// Cap that refills every period
    Allowance = 2,
}

impl LimitType {
    /// Variant name used in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlimited => "Unlimited",
            Self::Lifetime => "Lifetime",
            Self::Allowance => "Allowance",
        }
    }
}

impl From<LimitType> for u8 {
    fn from(value: LimitType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for LimitType {
    type Error = SsoError;

    fn try_from(value: u8) -> SsoResult<Self> {
        match value {
            0 => Ok(Self::Unlimited),
            1 => Ok(Self::Lifetime),
            2 => Ok(Self::Allowance),
            other => Err(SsoError::serialization(format!(
                "unknown limit type discriminant {other}"
            ))),
        }
    }
}

impl FromStr for LimitType {
    type Err = SsoError;

    fn from_str(s: &str) -> SsoResult<Self> {
        match s {
            "Unlimited" => Ok(Self::Unlimited),
            "Lifetime" => Ok(Self::Lifetime),
            "Allowance" => Ok(Self::Allowance),
            other => Err(SsoError::serialization(format!(
                "unknown limit type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for LimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LimitType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LimitType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::serialization::deserialize_wire_enum(deserializer)
    }
}

/// Cap on cumulative consumption of one resource.
///
/// The validator ignores `limit` and `period` for some limit types but still
/// stores and hashes them. Those values are kept in the `ignored_*` fields so
/// that a limit read from the wire encodes back to the same tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "UsageLimitParts", try_from = "UsageLimitParts")]
pub enum UsageLimit {
    /// No cap
    Unlimited {
        /// Wire `limit`, not enforced
        ignored_limit: U256,
        /// Wire `period`, not enforced
        ignored_period: U256,
    },
    /// `limit` for the whole life of the session
    Lifetime {
        /// Total amount
        limit: U256,
        /// Wire `period`, not enforced
        ignored_period: U256,
    },
    /// `limit` per `period` seconds
    Allowance {
        /// Amount per period
        limit: U256,
        /// Period length in seconds, always positive
        period: U256,
    },
}

impl UsageLimit {
    /// No cap
    pub const UNLIMITED: UsageLimit = UsageLimit::Unlimited {
        ignored_limit: U256::ZERO,
        ignored_period: U256::ZERO,
    };

    /// Nothing may be consumed
    pub const ZERO: UsageLimit = UsageLimit::Lifetime {
        limit: U256::ZERO,
        ignored_period: U256::ZERO,
    };

    /// Lifetime cap of `limit`
    pub fn lifetime(limit: U256) -> Self {
        Self::Lifetime {
            limit,
            ignored_period: U256::ZERO,
        }
    }

    /// Allowance of `limit` per `period` seconds
    pub fn allowance(limit: U256, period: U256) -> SsoResult<Self> {
        let limit = Self::Allowance { limit, period };
        limit.validate()?;
        Ok(limit)
    }

    /// Discriminant of this limit
    pub fn limit_type(&self) -> LimitType {
        match self {
            Self::Unlimited { .. } => LimitType::Unlimited,
            Self::Lifetime { .. } => LimitType::Lifetime,
            Self::Allowance { .. } => LimitType::Allowance,
        }
    }

    /// Enforced cap amount, zero for `Unlimited`
    pub fn limit(&self) -> U256 {
        match self {
            Self::Unlimited { .. } => U256::ZERO,
            Self::Lifetime { limit, .. } | Self::Allowance { limit, .. } => *limit,
        }
    }

    /// Enforced period length, zero unless `Allowance`
    pub fn period(&self) -> U256 {
        match self {
            Self::Allowance { period, .. } => *period,
            _ => U256::ZERO,
        }
    }

    /// True for `Unlimited`
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited { .. })
    }

    /// True when every ignored field is zero
    pub fn is_canonical(&self) -> bool {
        match self {
            Self::Unlimited {
                ignored_limit,
                ignored_period,
            } => ignored_limit.is_zero() && ignored_period.is_zero(),
            Self::Lifetime { ignored_period, .. } => ignored_period.is_zero(),
            Self::Allowance { .. } => true,
        }
    }

    /// Check the limit invariants.
    ///
    /// Only `Allowance` can be invalid: its period must be positive.
    pub fn validate(&self) -> SsoResult<()> {
        match self {
            Self::Allowance { period, .. } if period.is_zero() => Err(SsoError::invalid_config(
                "allowance limit requires a positive period",
            )),
            _ => Ok(()),
        }
    }

    /// Flatten into the wire shape, ignored fields included
    pub fn to_parts(&self) -> UsageLimitParts {
        let (limit, period) = match *self {
            Self::Unlimited {
                ignored_limit,
                ignored_period,
            } => (ignored_limit, ignored_period),
            Self::Lifetime {
                limit,
                ignored_period,
            } => (limit, ignored_period),
            Self::Allowance { limit, period } => (limit, period),
        };
        UsageLimitParts {
            limit_type: self.limit_type(),
            limit,
            period,
        }
    }

    /// Rebuild from the wire shape.
    ///
    /// Fields the limit type ignores are kept verbatim; only an allowance
    /// without a period is rejected.
    pub fn from_parts(parts: UsageLimitParts) -> SsoResult<Self> {
        let UsageLimitParts {
            limit_type,
            limit,
            period,
        } = parts;
        let limit = match limit_type {
            LimitType::Unlimited => Self::Unlimited {
                ignored_limit: limit,
                ignored_period: period,
            },
            LimitType::Lifetime => Self::Lifetime {
                limit,
                ignored_period: period,
            },
            LimitType::Allowance => Self::allowance(limit, period)?,
        };
        if !limit.is_canonical() {
            tracing::debug!(%limit, ?parts, "usage limit carries ignored fields");
        }
        Ok(limit)
    }
}

impl Default for UsageLimit {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for UsageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited { .. } => f.write_str("unlimited"),
            Self::Lifetime { limit, .. } => write!(f, "{limit} lifetime"),
            Self::Allowance { limit, period } => write!(f, "{limit} per {period}s"),
        }
    }
}

/// Wire and ABI shape of a [`UsageLimit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UsageLimitParts {
    /// Discriminant
    pub limit_type: LimitType,
    /// Cap amount
    #[serde(with = "decimal_u256")]
    pub limit: U256,
    /// Period length in seconds
    #[serde(with = "decimal_u256")]
    pub period: U256,
}

impl From<UsageLimit> for UsageLimitParts {
    fn from(limit: UsageLimit) -> Self {
        limit.to_parts()
    }
}

impl TryFrom<UsageLimitParts> for UsageLimit {
    type Error = SsoError;

    fn try_from(parts: UsageLimitParts) -> SsoResult<Self> {
        Self::from_parts(parts)
    }
}
