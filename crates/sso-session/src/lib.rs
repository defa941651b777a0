//! SSO Session - Session Policy Engine
//!
//! Client-side mirror of the session key validator's bookkeeping.
//!
//! ## Exposure
//! - `max_period_spend`: total an allowance can release before expiry
//! - `ExposureAggregator`: worst case per token across all policies
//!
//! ## Reconciliation
//! - `Reconciler`: consumption per token from live remaining balances
//! - `session_lifecycle`: not initialized / active / expired / closed
//!
//! ## Identity and encoding
//! - `session_hash`: `keccak256(abi.encode(spec))`
//! - `abi`: `createSession`, `revokeKey`, `sessionState` call data
//! - `encode_session_tx`: spec and period ids for a session transaction
//! - `prohibited_targets`: policies aimed at the account or system contracts
//!
//! Everything except the lifecycle helpers is synchronous and pure: results
//! depend only on the spec, the state snapshot and the explicit timestamp.
//!
//! ```rust
//! use sso_core::{SessionSpec, Timestamp, UsageLimit, U256, Address, DEFAULT_BASE_TOKEN};
//! use sso_session::{aggregate_exposure, Exposure};
//!
//! let spec = SessionSpec {
//!     signer: Address::ZERO,
//!     expires_at: U256::from(7_200u64),
//!     fee_limit: UsageLimit::allowance(U256::from(10u64), U256::from(3_600u64)).unwrap(),
//!     call_policies: vec![],
//!     transfer_policies: vec![],
//! };
//! let exposure = aggregate_exposure(&spec, Timestamp::from_secs(0)).unwrap();
//! assert_eq!(exposure[&DEFAULT_BASE_TOKEN], Exposure::Limited(U256::from(30u64)));
//! ```

#![forbid(unsafe_code)]

/// Session validator ABI and call data
pub mod abi;

/// External collaborator traits
pub mod effects;

/// Worst-case exposure per token
pub mod exposure;

/// Session identity
pub mod hash;

/// Session lifecycle and submission
pub mod lifecycle;

/// Allowance arithmetic
pub mod period;

/// Period ids for session transactions
pub mod period_ids;

/// Policy targets that must never be reachable
pub mod prohibited;

/// Consumption from on-chain state
pub mod reconcile;

/// Display summaries with token metadata
pub mod summary;

/// Predicates over session state
pub mod validation;

pub use abi::{
    call_selector, create_session_calldata, decode_create_session_calldata, decode_session_state,
    encode_session_params, encode_session_tx, revoke_session_calldata, session_state_calldata,
};
pub use effects::{
    SessionSigner, SessionStateReader, SessionSubmitter, SubmissionReceipt, TokenLookup,
    TokenMetadata,
};
pub use exposure::{aggregate_exposure, Exposure, ExposureAggregator, ExposureMap};
pub use hash::{session_hash, session_hash_from_json, SessionHash};
pub use lifecycle::{
    create_session, fetch_reconciliation, is_usable, prepare_session, revoke_session,
    session_lifecycle, PreparedSession, SessionLifecycle,
};
pub use period::{max_period_spend, validator_period_spend, worst_case_spend};
pub use period_ids::{find_policy, period_id, period_ids_for_transaction};
pub use prohibited::{check_target, prohibited_targets, ProhibitedReason, ProhibitedTarget};
pub use reconcile::{
    reconcile, spent_by_token, LimitSource, Mismatch, Reconciler, Reconciliation, SpentMap,
    StateList,
};
pub use summary::{summarize_exposure, summarize_spent, SpendSummary, TokenAmount};
pub use validation::{verify_state, Comparison, StateCheck};
