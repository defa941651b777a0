//! Period-limit calculator
//!
//! An allowance of `limit` per `period` that starts at `start` and ends at
//! `expiry` can be drawn in full once per window, and a session spanning
//! `expiry - start` seconds touches `1 + (expiry - start) / period` windows.
//!
//! The validator numbers windows from the Unix epoch (`timestamp / period`).
//! When `start` is not a multiple of `period` the session can straddle one
//! epoch window more than the start-anchored count. [`validator_period_spend`]
//! counts epoch windows instead.

use crate::exposure::Exposure;
use alloy_primitives::U256;
use sso_core::{SsoError, SsoResult, Timestamp, UsageLimit};

fn check_period(period_seconds: U256) -> SsoResult<()> {
    if period_seconds.is_zero() {
        return Err(SsoError::invalid_config(
            "allowance period must be positive",
        ));
    }
    Ok(())
}

fn windows_total(
    windows: Option<U256>,
    session_start: Timestamp,
    session_expiry: U256,
    limit_per_period: U256,
    period_seconds: U256,
) -> Exposure {
    match windows.and_then(|w| w.checked_mul(limit_per_period)) {
        Some(total) => Exposure::Limited(total),
        None => {
            tracing::warn!(
                %session_start,
                %session_expiry,
                %limit_per_period,
                %period_seconds,
                "allowance total overflows 256 bits; treating as unlimited"
            );
            Exposure::Unlimited
        }
    }
}

/// Maximum total spend of an allowance over a session's lifetime.
///
/// All arguments are in seconds. An expiry at or before the start still
/// allows one full period. Overflow yields [`Exposure::Unlimited`].
///
/// Windows are anchored at `session_start`. For a start that is not a
/// multiple of the period the validator may release one more window; see
/// [`validator_period_spend`].
pub fn max_period_spend(
    session_start: Timestamp,
    session_expiry: U256,
    limit_per_period: U256,
    period_seconds: U256,
) -> SsoResult<Exposure> {
    check_period(period_seconds)?;

    let start = session_start.to_u256();
    if !(start % period_seconds).is_zero() {
        tracing::debug!(
            %session_start,
            %period_seconds,
            "session start not aligned to epoch windows; on-chain total may be one period higher"
        );
    }
    let elapsed = session_expiry.saturating_sub(start);
    let windows = (elapsed / period_seconds).checked_add(U256::from(1u64));
    Ok(windows_total(
        windows,
        session_start,
        session_expiry,
        limit_per_period,
        period_seconds,
    ))
}

/// Maximum total spend counting the validator's epoch-aligned windows.
///
/// Equal to [`max_period_spend`] when `session_start` is a multiple of the
/// period, otherwise at most one period more.
pub fn validator_period_spend(
    session_start: Timestamp,
    session_expiry: U256,
    limit_per_period: U256,
    period_seconds: U256,
) -> SsoResult<Exposure> {
    check_period(period_seconds)?;

    let start = session_start.to_u256();
    let first = start / period_seconds;
    let last = session_expiry.max(start) / period_seconds;
    let windows = (last - first).checked_add(U256::from(1u64));
    Ok(windows_total(
        windows,
        session_start,
        session_expiry,
        limit_per_period,
        period_seconds,
    ))
}

/// Worst-case consumption of one limit between `session_start` and `session_expiry`
pub fn worst_case_spend(
    limit: &UsageLimit,
    session_start: Timestamp,
    session_expiry: U256,
) -> SsoResult<Exposure> {
    match *limit {
        UsageLimit::Unlimited { .. } => Ok(Exposure::Unlimited),
        UsageLimit::Lifetime { limit, .. } => Ok(Exposure::Limited(limit)),
        UsageLimit::Allowance { limit, period } => {
            max_period_spend(session_start, session_expiry, limit, period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spend(start: u64, expiry: u64, limit: u64, period: u64) -> SsoResult<Exposure> {
        max_period_spend(
            Timestamp::from_secs(start),
            U256::from(expiry),
            U256::from(limit),
            U256::from(period),
        )
    }

    fn limited(n: u64) -> Exposure {
        Exposure::Limited(U256::from(n))
    }

    #[test]
    fn test_period_boundaries() {
        let s = 1_700_000_000;
        assert_eq!(spend(s, s, 10, 3600).unwrap(), limited(10));
        assert_eq!(spend(s, s + 3599, 10, 3600).unwrap(), limited(10));
        assert_eq!(spend(s, s + 3600, 10, 3600).unwrap(), limited(20));
        assert_eq!(spend(s, s + 86_400, 10, 3600).unwrap(), limited(250));
    }

    #[test]
    fn test_expiry_before_start_is_one_period() {
        assert_eq!(spend(1_000, 10, 7, 60).unwrap(), limited(7));
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(spend(0, 100, 1, 0).unwrap_err().is_invalid_config());
    }

    #[test]
    fn test_overflow_is_unlimited() {
        let result = max_period_spend(
            Timestamp::EPOCH,
            U256::from(10u64),
            U256::MAX,
            U256::from(1u64),
        )
        .unwrap();
        assert_eq!(result, Exposure::Unlimited);

        // one reset of MAX fits
        let result =
            max_period_spend(Timestamp::EPOCH, U256::ZERO, U256::MAX, U256::from(1u64)).unwrap();
        assert_eq!(result, Exposure::Limited(U256::MAX));
    }

    fn epoch_spend(start: u64, expiry: u64, limit: u64, period: u64) -> SsoResult<Exposure> {
        validator_period_spend(
            Timestamp::from_secs(start),
            U256::from(expiry),
            U256::from(limit),
            U256::from(period),
        )
    }

    #[test]
    fn test_misaligned_start_straddles_extra_window() {
        // windows [0, 60) and [60, 120) are both touched
        assert_eq!(spend(50, 70, 10, 60).unwrap(), limited(10));
        assert_eq!(epoch_spend(50, 70, 10, 60).unwrap(), limited(20));

        // aligned starts agree
        assert_eq!(epoch_spend(60, 179, 10, 60).unwrap(), spend(60, 179, 10, 60).unwrap());
        assert_eq!(epoch_spend(60, 10, 10, 60).unwrap(), limited(10));
        assert!(epoch_spend(0, 100, 1, 0).unwrap_err().is_invalid_config());
    }

    #[test]
    fn test_worst_case_by_kind() {
        let t = Timestamp::from_secs(0);
        let expiry = U256::from(120u64);
        assert_eq!(
            worst_case_spend(&UsageLimit::UNLIMITED, t, expiry).unwrap(),
            Exposure::Unlimited
        );
        assert_eq!(
            worst_case_spend(&UsageLimit::lifetime(U256::from(5u64)), t, expiry).unwrap(),
            limited(5)
        );
        let allowance = UsageLimit::allowance(U256::from(5u64), U256::from(60u64)).unwrap();
        assert_eq!(worst_case_spend(&allowance, t, expiry).unwrap(), limited(15));
    }
}
