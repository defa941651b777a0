//! Exposure aggregator
//!
//! Computes, per token, the most a session could ever move. Native value and
//! fees are accounted under the configured base token; ERC-20 `transfer` and
//! `approve` policies are accounted under their target contract.
//!
//! Overlapping policies on the same token add up. Within one ERC-20 policy
//! every amount constraint must hold on each call, so the tightest one
//! bounds the policy.

use crate::effects::TokenLookup;
use crate::period::worst_case_spend;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sso_core::serialization::{format_decimal_u256, parse_decimal_u256};
use sso_core::{CallSpec, EngineConfig, SessionSpec, SsoResult, Timestamp, TokenCall};
use std::collections::BTreeMap;
use std::fmt;

/// Worst-case amount of one token.
///
/// Ordered so that every `Limited` amount is below `Unlimited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Exposure {
    /// Bounded amount in the token's smallest unit
    Limited(U256),
    /// No bound
    Unlimited,
}

impl Exposure {
    /// Nothing can be moved
    pub const ZERO: Exposure = Exposure::Limited(U256::ZERO);

    /// True for `Unlimited`
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// True for `Limited(0)`
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Limited(v) if v.is_zero())
    }

    /// Bounded amount, `None` when unlimited
    pub fn amount(&self) -> Option<U256> {
        match self {
            Self::Limited(v) => Some(*v),
            Self::Unlimited => None,
        }
    }

    /// Combine two independent exposures of the same token.
    ///
    /// Unlimited absorbs; a sum that overflows becomes unlimited.
    pub fn merge(self, other: Exposure) -> Exposure {
        match (self, other) {
            (Self::Limited(a), Self::Limited(b)) => match a.checked_add(b) {
                Some(sum) => Self::Limited(sum),
                None => {
                    tracing::warn!(%a, %b, "exposure sum overflows 256 bits; treating as unlimited");
                    Self::Unlimited
                }
            },
            _ => Self::Unlimited,
        }
    }
}

impl Default for Exposure {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<U256> for Exposure {
    fn from(value: U256) -> Self {
        Self::Limited(value)
    }
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(v) => write!(f, "{v}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Exposure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(v) => serializer.serialize_str(&format_decimal_u256(v)),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Exposure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "unlimited" {
            return Ok(Self::Unlimited);
        }
        parse_decimal_u256(&s)
            .map(Self::Limited)
            .map_err(serde::de::Error::custom)
    }
}

/// Worst-case exposure per token
pub type ExposureMap = BTreeMap<Address, Exposure>;

/// Per-token exposure calculation over a session spec
#[derive(Clone, Copy)]
pub struct ExposureAggregator<'a> {
    config: &'a EngineConfig,
    tokens: Option<&'a dyn TokenLookup>,
}

impl<'a> ExposureAggregator<'a> {
    /// Aggregator without token metadata
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            tokens: None,
        }
    }

    /// Treat calls with unrecognised selectors on known tokens as unbounded
    pub fn with_token_lookup(mut self, tokens: &'a dyn TokenLookup) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Worst-case exposure of `spec` for a session starting at `now`.
    ///
    /// The result always contains the base token. Entries may be zero.
    pub fn aggregate(&self, spec: &SessionSpec, now: Timestamp) -> SsoResult<ExposureMap> {
        let expiry = spec.expires_at;
        let base = self.config.base_token;
        let mut exposure = ExposureMap::new();

        exposure.insert(base, worst_case_spend(&spec.fee_limit, now, expiry)?);

        for transfer in &spec.transfer_policies {
            let value = worst_case_spend(&transfer.value_limit, now, expiry)?;
            merge_into(&mut exposure, base, value);
        }

        for call in &spec.call_policies {
            let value = worst_case_spend(&call.value_limit, now, expiry)?;
            merge_into(&mut exposure, base, value);

            if let Some(token_exposure) = self.call_token_exposure(call, now, expiry)? {
                merge_into(&mut exposure, call.target, token_exposure);
            }
        }

        if self.config.warn_on_unlimited {
            for (token, _) in exposure.iter().filter(|(_, e)| e.is_unlimited()) {
                tracing::warn!(%token, signer = %spec.signer, "session grants unlimited exposure");
            }
        }
        tracing::debug!(
            signer = %spec.signer,
            tokens = exposure.len(),
            "aggregated session exposure"
        );
        Ok(exposure)
    }

    fn call_token_exposure(
        &self,
        call: &CallSpec,
        now: Timestamp,
        expiry: U256,
    ) -> SsoResult<Option<Exposure>> {
        let Some(token_call) = TokenCall::from_selector(&call.selector) else {
            let known = self
                .tokens
                .and_then(|tokens| tokens.token(&call.target))
                .is_some();
            if known {
                tracing::debug!(
                    policy_target = %call.target,
                    selector = %call.selector,
                    "unrecognised selector on a known token"
                );
                return Ok(Some(Exposure::Unlimited));
            }
            return Ok(None);
        };

        let amount_index = token_call.amount_index();
        let mut tightest = Exposure::Unlimited;
        for constraint in call.constraints.iter().filter(|c| c.index == amount_index) {
            tightest = tightest.min(worst_case_spend(&constraint.limit, now, expiry)?);
        }
        Ok(Some(tightest))
    }
}

fn merge_into(map: &mut ExposureMap, token: Address, value: Exposure) {
    let entry = map.entry(token).or_insert(Exposure::ZERO);
    *entry = entry.merge(value);
}

/// Aggregate with the default engine configuration and no token metadata
pub fn aggregate_exposure(spec: &SessionSpec, now: Timestamp) -> SsoResult<ExposureMap> {
    let config = EngineConfig::default();
    ExposureAggregator::new(&config).aggregate(spec, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposure_order() {
        let small = Exposure::Limited(U256::from(1u64));
        let big = Exposure::Limited(U256::MAX);
        assert!(small < big);
        assert!(big < Exposure::Unlimited);
        assert_eq!(Exposure::Unlimited.min(small), small);
    }

    #[test]
    fn test_merge() {
        let a = Exposure::Limited(U256::from(2u64));
        assert_eq!(a.merge(a), Exposure::Limited(U256::from(4u64)));
        assert_eq!(a.merge(Exposure::Unlimited), Exposure::Unlimited);
        assert_eq!(Exposure::Unlimited.merge(a), Exposure::Unlimited);
        assert_eq!(
            Exposure::Limited(U256::MAX).merge(a),
            Exposure::Unlimited
        );
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Exposure::Limited(U256::from(60u64))).unwrap();
        assert_eq!(json, "\"60\"");
        assert_eq!(
            serde_json::to_string(&Exposure::Unlimited).unwrap(),
            "\"unlimited\""
        );
        let back: Exposure = serde_json::from_str("\"unlimited\"").unwrap();
        assert!(back.is_unlimited());
        assert!(serde_json::from_str::<Exposure>("\"060\"").is_err());
    }
}
