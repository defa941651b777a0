//! External collaborators
//!
//! The engine never talks to a chain, a wallet or a price feed itself. These
//! traits are the seams through which callers supply those capabilities.
//!
//! - `TokenLookup`: token metadata, synchronous and side-effect free
//! - `SessionStateReader`: reads `sessionState` from the validator
//! - `SessionSubmitter`: broadcasts `createSession` / `revokeKey`
//! - `SessionSigner`: signs with the session key

use crate::hash::SessionHash;
use crate::lifecycle::PreparedSession;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sso_core::{SessionSpec, SessionState, SsoResult};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Token metadata owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token contract
    pub address: Address,
    /// Ticker
    pub symbol: String,
    /// Decimal places of the smallest unit
    pub decimals: u8,
    /// USD price of one whole token, when known
    pub price: Option<f64>,
}

/// Source of token metadata
pub trait TokenLookup {
    /// Metadata for `address`, `None` when it is not a known token
    fn token(&self, address: &Address) -> Option<TokenMetadata>;
}

impl<F> TokenLookup for F
where
    F: Fn(&Address) -> Option<TokenMetadata>,
{
    fn token(&self, address: &Address) -> Option<TokenMetadata> {
        self(address)
    }
}

impl TokenLookup for BTreeMap<Address, TokenMetadata> {
    fn token(&self, address: &Address) -> Option<TokenMetadata> {
        self.get(address).cloned()
    }
}

impl<S: BuildHasher> TokenLookup for HashMap<Address, TokenMetadata, S> {
    fn token(&self, address: &Address) -> Option<TokenMetadata> {
        self.get(address).cloned()
    }
}

/// Reads live session state from the validator
#[async_trait]
pub trait SessionStateReader: Send + Sync {
    /// Current state of `spec` on `account`
    async fn read_session_state(
        &self,
        account: Address,
        spec: &SessionSpec,
    ) -> SsoResult<SessionState>;
}

/// Outcome of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Hash of the transaction that carried the call
    pub transaction_hash: B256,
    /// Session the transaction created or revoked
    pub session_hash: SessionHash,
}

/// Broadcasts session transactions
#[async_trait]
pub trait SessionSubmitter: Send + Sync {
    /// Submit `createSession` for a prepared session
    async fn create_session(&self, session: &PreparedSession) -> SsoResult<SubmissionReceipt>;

    /// Submit `revokeKey` for a session hash
    async fn revoke_session(&self, hash: SessionHash) -> SsoResult<SubmissionReceipt>;
}

/// Signs on behalf of a session key
#[async_trait]
pub trait SessionSigner: Send + Sync {
    /// Session key address, matches `SessionSpec::signer`
    fn address(&self) -> Address;

    /// Sign a 32-byte digest
    async fn sign_hash(&self, hash: B256) -> SsoResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> TokenMetadata {
        TokenMetadata {
            address: Address::with_last_byte(1),
            symbol: "USDC".into(),
            decimals: 6,
            price: Some(1.0),
        }
    }

    #[test]
    fn test_lookup_impls() {
        let token = usdc();
        let map: BTreeMap<_, _> = [(token.address, token.clone())].into_iter().collect();
        assert_eq!(map.token(&token.address), Some(token.clone()));
        assert_eq!(map.token(&Address::ZERO), None);

        let hashed: HashMap<_, _> = [(token.address, token.clone())].into_iter().collect();
        assert_eq!(hashed.token(&token.address), Some(token.clone()));

        let closure = |a: &Address| (*a == Address::with_last_byte(1)).then(usdc);
        assert_eq!(closure.token(&token.address), Some(token));
    }
}
