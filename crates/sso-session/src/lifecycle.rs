//! Session lifecycle
//!
//! Create → active → expired or closed. Creation and revocation go through a
//! caller-supplied [`SessionSubmitter`]; reading state goes through a
//! [`SessionStateReader`]. Nothing here retries or waits.

use crate::abi::create_session_calldata;
use crate::effects::{SessionStateReader, SessionSubmitter, SubmissionReceipt};
use crate::hash::{session_hash, SessionHash};
use crate::reconcile::{reconcile, Reconciliation};
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use sso_core::{SessionSpec, SessionState, SsoResult, Status, Timestamp};

/// Where a session stands at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionLifecycle {
    /// Not created on-chain
    NotInitialized,
    /// Created and usable
    Active,
    /// Created but past `expires_at`
    Expired,
    /// Revoked
    Closed,
}

impl SessionLifecycle {
    /// True only for `Active`
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Lifecycle of `spec` given its on-chain state at `now`
pub fn session_lifecycle(spec: &SessionSpec, state: &SessionState, now: Timestamp) -> SessionLifecycle {
    match state.status {
        Status::NotInitialized => SessionLifecycle::NotInitialized,
        Status::Closed => SessionLifecycle::Closed,
        Status::Active if spec.is_expired_at(now) => SessionLifecycle::Expired,
        Status::Active => SessionLifecycle::Active,
    }
}

/// True when the session key may still transact at `now`
pub fn is_usable(spec: &SessionSpec, state: &SessionState, now: Timestamp) -> bool {
    session_lifecycle(spec, state, now).is_usable()
}

/// A spec checked for submission, with its identity and call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSession {
    /// Spec to submit
    pub spec: SessionSpec,
    /// Session identity
    pub hash: SessionHash,
    /// `createSession` call data
    pub calldata: Bytes,
}

/// Validate `spec` for submission at `now`, hash it, and encode the call
pub fn prepare_session(spec: SessionSpec, now: Timestamp) -> SsoResult<PreparedSession> {
    spec.validate_for_submission(now)?;
    let hash = session_hash(&spec)?;
    let calldata = create_session_calldata(&spec)?;
    tracing::debug!(%hash, signer = %spec.signer, "prepared session");
    Ok(PreparedSession {
        spec,
        hash,
        calldata,
    })
}

/// Prepare and submit a session
pub async fn create_session(
    submitter: &dyn SessionSubmitter,
    spec: SessionSpec,
    now: Timestamp,
) -> SsoResult<SubmissionReceipt> {
    let prepared = prepare_session(spec, now)?;
    let receipt = submitter.create_session(&prepared).await?;
    tracing::info!(
        session = %receipt.session_hash,
        tx = %receipt.transaction_hash,
        "session created"
    );
    Ok(receipt)
}

/// Submit a revocation
pub async fn revoke_session(
    submitter: &dyn SessionSubmitter,
    hash: SessionHash,
) -> SsoResult<SubmissionReceipt> {
    let receipt = submitter.revoke_session(hash).await?;
    tracing::info!(session = %hash, tx = %receipt.transaction_hash, "session revoked");
    Ok(receipt)
}

/// Read the live state of `spec` and reconcile it
pub async fn fetch_reconciliation(
    reader: &dyn SessionStateReader,
    account: Address,
    spec: &SessionSpec,
) -> SsoResult<(SessionState, Reconciliation)> {
    let state = reader.read_session_state(account, spec).await?;
    let reconciliation = reconcile(spec, &state);
    Ok((state, reconciliation))
}
