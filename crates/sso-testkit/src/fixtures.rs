//! Hand-built specs and states

use alloy_primitives::{address, Address, U256};
use sso_core::{
    CallSpec, Constraint, LimitState, Selector, SessionSpec, SessionState, Status, TransferSpec,
    UsageLimit, APPROVE_SELECTOR, DEFAULT_BASE_TOKEN, TRANSFER_SELECTOR,
};

/// Session key used by fixtures
pub fn sample_signer() -> Address {
    address!("1111111111111111111111111111111111111111")
}

/// ERC-20 token used by fixtures
pub fn sample_token() -> Address {
    address!("2222222222222222222222222222222222222222")
}

/// Second ERC-20 token
pub fn other_token() -> Address {
    address!("4444444444444444444444444444444444444444")
}

/// Plain value recipient used by fixtures
pub fn sample_recipient() -> Address {
    address!("3333333333333333333333333333333333333333")
}

/// Native token address under the default configuration
pub fn base_token() -> Address {
    DEFAULT_BASE_TOKEN
}

/// Shorthand for `U256::from`
pub fn u(value: u64) -> U256 {
    U256::from(value)
}

/// Builder for `SessionSpec` fixtures.
///
/// Defaults: expiry 0, zero fee limit, no policies.
#[derive(Debug, Clone)]
pub struct SessionSpecBuilder {
    spec: SessionSpec,
}

impl SessionSpecBuilder {
    /// Start a spec for `signer`
    pub fn new(signer: Address) -> Self {
        Self {
            spec: SessionSpec {
                signer,
                expires_at: U256::ZERO,
                fee_limit: UsageLimit::ZERO,
                call_policies: Vec::new(),
                transfer_policies: Vec::new(),
            },
        }
    }

    /// Set the expiry in seconds
    pub fn expires_at(mut self, secs: u64) -> Self {
        self.spec.expires_at = U256::from(secs);
        self
    }

    /// Set the fee limit
    pub fn fee_limit(mut self, limit: UsageLimit) -> Self {
        self.spec.fee_limit = limit;
        self
    }

    /// Add a plain value transfer policy
    pub fn transfer(mut self, target: Address, value_limit: UsageLimit) -> Self {
        self.spec.transfer_policies.push(TransferSpec {
            target,
            max_value_per_use: U256::MAX,
            value_limit,
        });
        self
    }

    /// Add an arbitrary call policy
    pub fn call(mut self, call: CallSpec) -> Self {
        self.spec.call_policies.push(call);
        self
    }

    /// Add an ERC-20 `transfer` policy capping the amount argument
    pub fn erc20_transfer(self, token: Address, amount_limit: UsageLimit) -> Self {
        self.call(token_call(token, TRANSFER_SELECTOR, vec![amount_limit]))
    }

    /// Add an ERC-20 `approve` policy capping the amount argument
    pub fn erc20_approve(self, token: Address, amount_limit: UsageLimit) -> Self {
        self.call(token_call(token, APPROVE_SELECTOR, vec![amount_limit]))
    }

    /// Finish the spec
    pub fn build(self) -> SessionSpec {
        self.spec
    }
}

/// Call policy on `token` with one amount constraint per entry in `amount_limits`
pub fn token_call(token: Address, selector: Selector, amount_limits: Vec<UsageLimit>) -> CallSpec {
    CallSpec {
        target: token,
        selector,
        max_value_per_use: U256::ZERO,
        value_limit: UsageLimit::ZERO,
        constraints: amount_limits
            .into_iter()
            .map(|limit| Constraint::limit_only(1, limit))
            .collect(),
    }
}

/// State of a session that was just created: active, nothing spent.
pub fn fresh_state(spec: &SessionSpec) -> SessionState {
    let value_entry = |remaining: U256, target: Address, selector: Selector| LimitState {
        remaining,
        target,
        selector,
        index: U256::ZERO,
    };
    SessionState {
        status: Status::Active,
        fees_remaining: spec.fee_limit.limit(),
        transfer_value: spec
            .transfer_policies
            .iter()
            .map(|t| value_entry(t.value_limit.limit(), t.target, Selector::ZERO))
            .collect(),
        call_value: spec
            .call_policies
            .iter()
            .map(|c| value_entry(c.value_limit.limit(), c.target, c.selector))
            .collect(),
        call_params: spec
            .call_policies
            .iter()
            .flat_map(|c| {
                c.constraints.iter().map(move |k| LimitState {
                    remaining: k.limit.limit(),
                    target: c.target,
                    selector: c.selector,
                    index: U256::from(k.index),
                })
            })
            .collect(),
    }
}
