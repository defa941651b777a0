//! Display summaries of exposure and spend
//!
//! Joins per-token amounts with caller-owned token metadata. USD totals are
//! floating point and meant for display only; the amounts themselves stay
//! exact.

use crate::effects::{TokenLookup, TokenMetadata};
use crate::exposure::{Exposure, ExposureMap};
use crate::reconcile::SpentMap;
use alloy_primitives::{Address, U256};
use serde::Serialize;
use sso_core::serialization::format_decimal_u256;

/// Amount of one known token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenAmount {
    /// Token metadata
    pub token: TokenMetadata,
    /// Amount in the token's smallest unit
    pub amount: Exposure,
}

/// Per-token amounts joined with metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSummary {
    /// Non-zero amounts of known tokens, in address order
    pub tokens: Vec<TokenAmount>,
    /// True when any listed token is unlimited
    pub has_unlimited: bool,
    /// USD value of the finite amounts with a known price
    pub total_usd: f64,
}

/// Summarize worst-case exposure
pub fn summarize_exposure(exposure: &ExposureMap, tokens: &dyn TokenLookup) -> SpendSummary {
    summarize(exposure.iter().map(|(a, e)| (*a, *e)), tokens)
}

/// Summarize reconciled spend
pub fn summarize_spent(spent: &SpentMap, tokens: &dyn TokenLookup) -> SpendSummary {
    summarize(spent.iter().map(|(a, v)| (*a, Exposure::Limited(*v))), tokens)
}

fn summarize(
    amounts: impl Iterator<Item = (Address, Exposure)>,
    tokens: &dyn TokenLookup,
) -> SpendSummary {
    let mut summary = SpendSummary::default();
    for (address, amount) in amounts {
        if amount.is_zero() {
            continue;
        }
        let Some(token) = tokens.token(&address) else {
            tracing::debug!(token = %address, "no metadata for token; omitted from summary");
            continue;
        };
        match amount {
            Exposure::Unlimited => summary.has_unlimited = true,
            Exposure::Limited(value) => {
                if let Some(price) = token.price {
                    summary.total_usd += to_units(value, token.decimals) * price;
                }
            }
        }
        summary.tokens.push(TokenAmount { token, amount });
    }
    summary
}

/// Amount in whole tokens, approximately
pub fn to_units(amount: U256, decimals: u8) -> f64 {
    let raw = format_decimal_u256(&amount).parse::<f64>().unwrap_or(f64::INFINITY);
    raw / 10f64.powi(i32::from(decimals))
}
