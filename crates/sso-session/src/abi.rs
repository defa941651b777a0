//! Session validator ABI
//!
//! The `contract` module mirrors the validator's Solidity structs and entry
//! points. Conversions to and from the model live here so that no other
//! module needs to know the wire layout.

use crate::hash::SessionHash;
use crate::period_ids::period_ids_for_transaction;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol_data, SolCall, SolType};
use sso_core::{
    CallSpec, Condition, Constraint, LimitState, LimitType, Selector, SessionSpec, SessionState,
    SsoError, SsoResult, Status, Timestamp, TransferSpec, UsageLimit, UsageLimitParts,
};

/// `(SessionSpec, uint64[])`, the session transaction signature suffix
type SessionTxParams = (contract::SessionSpec, sol_data::Array<sol_data::Uint<64>>);

/// Solidity bindings for the session key validator
#[allow(missing_docs)]
pub mod contract {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct UsageLimit {
            uint8 limitType;
            uint256 limit;
            uint256 period;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Constraint {
            uint8 condition;
            uint64 index;
            bytes32 refValue;
            UsageLimit limit;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CallSpec {
            address target;
            bytes4 selector;
            uint256 maxValuePerUse;
            UsageLimit valueLimit;
            Constraint[] constraints;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct TransferSpec {
            address target;
            uint256 maxValuePerUse;
            UsageLimit valueLimit;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SessionSpec {
            address signer;
            uint256 expiresAt;
            UsageLimit feeLimit;
            CallSpec[] callPolicies;
            TransferSpec[] transferPolicies;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct LimitState {
            uint256 remaining;
            address target;
            bytes4 selector;
            uint256 index;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SessionState {
            uint8 status;
            uint256 feesRemaining;
            LimitState[] transferValue;
            LimitState[] callValue;
            LimitState[] callParams;
        }

        struct SessionParams {
            SessionSpec sessionSpec;
        }

        function createSession(SessionSpec sessionSpec) external;
        function revokeKey(bytes32 sessionHash) external;
        function sessionState(address account, SessionSpec spec) external view returns (SessionState);
    }
}

impl From<&UsageLimit> for contract::UsageLimit {
    fn from(limit: &UsageLimit) -> Self {
        let parts = limit.to_parts();
        Self {
            limitType: parts.limit_type.into(),
            limit: parts.limit,
            period: parts.period,
        }
    }
}

impl TryFrom<contract::UsageLimit> for UsageLimit {
    type Error = SsoError;

    fn try_from(raw: contract::UsageLimit) -> SsoResult<Self> {
        UsageLimit::from_parts(UsageLimitParts {
            limit_type: LimitType::try_from(raw.limitType)?,
            limit: raw.limit,
            period: raw.period,
        })
    }
}

impl From<&Constraint> for contract::Constraint {
    fn from(c: &Constraint) -> Self {
        Self {
            condition: c.condition.into(),
            index: c.index,
            refValue: c.ref_value,
            limit: (&c.limit).into(),
        }
    }
}

impl TryFrom<contract::Constraint> for Constraint {
    type Error = SsoError;

    fn try_from(raw: contract::Constraint) -> SsoResult<Self> {
        Ok(Self {
            condition: Condition::try_from(raw.condition)?,
            index: raw.index,
            ref_value: raw.refValue,
            limit: raw.limit.try_into()?,
        })
    }
}

impl From<&CallSpec> for contract::CallSpec {
    fn from(c: &CallSpec) -> Self {
        Self {
            target: c.target,
            selector: c.selector,
            maxValuePerUse: c.max_value_per_use,
            valueLimit: (&c.value_limit).into(),
            constraints: c.constraints.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<contract::CallSpec> for CallSpec {
    type Error = SsoError;

    fn try_from(raw: contract::CallSpec) -> SsoResult<Self> {
        Ok(Self {
            target: raw.target,
            selector: raw.selector,
            max_value_per_use: raw.maxValuePerUse,
            value_limit: raw.valueLimit.try_into()?,
            constraints: raw
                .constraints
                .into_iter()
                .map(TryInto::try_into)
                .collect::<SsoResult<_>>()?,
        })
    }
}

impl From<&TransferSpec> for contract::TransferSpec {
    fn from(t: &TransferSpec) -> Self {
        Self {
            target: t.target,
            maxValuePerUse: t.max_value_per_use,
            valueLimit: (&t.value_limit).into(),
        }
    }
}

impl TryFrom<contract::TransferSpec> for TransferSpec {
    type Error = SsoError;

    fn try_from(raw: contract::TransferSpec) -> SsoResult<Self> {
        Ok(Self {
            target: raw.target,
            max_value_per_use: raw.maxValuePerUse,
            value_limit: raw.valueLimit.try_into()?,
        })
    }
}

impl From<&SessionSpec> for contract::SessionSpec {
    fn from(spec: &SessionSpec) -> Self {
        Self {
            signer: spec.signer,
            expiresAt: spec.expires_at,
            feeLimit: (&spec.fee_limit).into(),
            callPolicies: spec.call_policies.iter().map(Into::into).collect(),
            transferPolicies: spec.transfer_policies.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<contract::SessionSpec> for SessionSpec {
    type Error = SsoError;

    fn try_from(raw: contract::SessionSpec) -> SsoResult<Self> {
        Ok(Self {
            signer: raw.signer,
            expires_at: raw.expiresAt,
            fee_limit: raw.feeLimit.try_into()?,
            call_policies: raw
                .callPolicies
                .into_iter()
                .map(TryInto::try_into)
                .collect::<SsoResult<_>>()?,
            transfer_policies: raw
                .transferPolicies
                .into_iter()
                .map(TryInto::try_into)
                .collect::<SsoResult<_>>()?,
        })
    }
}

impl From<contract::LimitState> for LimitState {
    fn from(raw: contract::LimitState) -> Self {
        Self {
            remaining: raw.remaining,
            target: raw.target,
            selector: raw.selector,
            index: raw.index,
        }
    }
}

impl TryFrom<contract::SessionState> for SessionState {
    type Error = SsoError;

    fn try_from(raw: contract::SessionState) -> SsoResult<Self> {
        let status = Status::try_from(raw.status)
            .map_err(|e| SsoError::encoding(format!("session state status: {e}")))?;
        Ok(Self {
            status,
            fees_remaining: raw.feesRemaining,
            transfer_value: raw.transferValue.into_iter().map(Into::into).collect(),
            call_value: raw.callValue.into_iter().map(Into::into).collect(),
            call_params: raw.callParams.into_iter().map(Into::into).collect(),
        })
    }
}

/// `abi.encode(sessionSpec)`, the preimage of the session hash.
pub fn encode_session_params(spec: &SessionSpec) -> SsoResult<Vec<u8>> {
    spec.validate()?;
    let params = contract::SessionParams {
        sessionSpec: spec.into(),
    };
    Ok(<contract::SessionParams as SolType>::abi_encode_params(&params))
}

/// Call data for `createSession(SessionSpec)`
pub fn create_session_calldata(spec: &SessionSpec) -> SsoResult<Bytes> {
    spec.validate()?;
    let call = contract::createSessionCall {
        sessionSpec: spec.into(),
    };
    Ok(call.abi_encode().into())
}

/// Recover the spec from `createSession` call data
pub fn decode_create_session_calldata(data: &[u8]) -> SsoResult<SessionSpec> {
    let call = contract::createSessionCall::abi_decode(data, true)
        .map_err(|e| SsoError::encoding(format!("createSession call data: {e}")))?;
    call.sessionSpec.try_into()
}

/// Selector of `call_data`; `None` for plain transfers and short data
pub fn call_selector(call_data: &[u8]) -> Option<Selector> {
    call_data
        .get(..4)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
        .map(Selector::from)
}

/// `abi.encode(spec, periodIds)` for a session transaction to `target`.
///
/// The validator reads this from the transaction signature to find the
/// session and the allowance window of every limit the transaction touches.
/// Fails with `NotFound` when no policy covers the transaction.
pub fn encode_session_tx(
    spec: &SessionSpec,
    target: Address,
    call_data: &[u8],
    at: Timestamp,
) -> SsoResult<Bytes> {
    spec.validate()?;
    let period_ids = period_ids_for_transaction(spec, target, call_selector(call_data), at)?;
    let raw: contract::SessionSpec = spec.into();
    Ok(<SessionTxParams as SolType>::abi_encode_params(&(raw, period_ids)).into())
}

/// Call data for `revokeKey(bytes32)`
pub fn revoke_session_calldata(hash: &SessionHash) -> Bytes {
    contract::revokeKeyCall {
        sessionHash: hash.to_b256(),
    }
    .abi_encode()
    .into()
}

/// Call data for `sessionState(address, SessionSpec)`
pub fn session_state_calldata(account: Address, spec: &SessionSpec) -> SsoResult<Bytes> {
    spec.validate()?;
    let call = contract::sessionStateCall {
        account,
        spec: spec.into(),
    };
    Ok(call.abi_encode().into())
}

/// Decode the return data of `sessionState`
pub fn decode_session_state(return_data: &[u8]) -> SsoResult<SessionState> {
    let ret = contract::sessionStateCall::abi_decode_returns(return_data, true)
        .map_err(|e| SsoError::encoding(format!("sessionState return data: {e}")))?;
    ret._0.try_into()
}
