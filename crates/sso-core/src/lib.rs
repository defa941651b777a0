//! SSO Core - Session Policy Model
//!
//! Value types shared by every crate in the workspace: the session policy
//! model, the on-chain state snapshot, the unified error type, canonical JSON
//! helpers and engine configuration. Nothing here performs I/O except
//! `EngineConfig::load_from_file`.
//!
//! ## Model
//! - `UsageLimit`: `Unlimited | Lifetime | Allowance`
//! - `Constraint`: condition + limit on one call argument
//! - `CallSpec`, `TransferSpec`: per-target policies
//! - `SessionSpec`: signer, expiry, fee limit and policies
//! - `SessionState`: remaining balances read back from the validator
//!
//! ## JSON
//! Field names are camelCase and every integer is a canonical decimal
//! string, so 256-bit values never pass through a double.

#![forbid(unsafe_code)]

/// Engine configuration
pub mod config;

/// Argument constraints on contract calls
pub mod constraint;

/// ERC-20 selectors understood by the engine
pub mod erc20;

/// Unified error handling
pub mod errors;

/// Usage limits
pub mod limit;

/// Call and transfer policies
pub mod policy;

/// Canonical JSON helpers
pub mod serialization;

/// Session specification
pub mod spec;

/// On-chain session state snapshot
pub mod state;

/// Timestamps
pub mod time;

pub use config::{EngineConfig, DEFAULT_BASE_TOKEN};
pub use constraint::{Condition, Constraint};
pub use erc20::{TokenCall, APPROVE_SELECTOR, TRANSFER_SELECTOR};
pub use errors::{SsoError, SsoResult};
pub use limit::{LimitType, UsageLimit, UsageLimitParts};
pub use policy::{CallSpec, Policy, Selector, TransferSpec};
pub use spec::SessionSpec;
pub use state::{LimitState, SessionState, Status};
pub use time::Timestamp;

// Re-export the primitive types used throughout the public API
pub use alloy_primitives::{Address, B256, U256};
