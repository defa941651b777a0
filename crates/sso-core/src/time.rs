//! Timestamps in seconds.
//!
//! Every engine computation takes "now" as an explicit `Timestamp` so results
//! depend only on their inputs. `Timestamp::now()` exists for callers at the
//! edge that need to capture the wall clock once.

use crate::errors::{SsoError, SsoResult};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The unix epoch
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp from seconds since the unix epoch
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the unix epoch
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Widen to the on-chain integer width
    pub fn to_u256(&self) -> U256 {
        U256::from(self.0)
    }

    /// Convert a `SystemTime`, rejecting instants before the epoch
    pub fn from_system_time(time: SystemTime) -> SsoResult<Self> {
        time.duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_secs()))
            .map_err(|e| SsoError::internal(format!("system time before unix epoch: {e}")))
    }

    /// Capture the current wall clock
    pub fn now() -> SsoResult<Self> {
        Self::from_system_time(SystemTime::now())
    }

    /// Timestamp `secs` later, saturating at `u64::MAX`
    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
