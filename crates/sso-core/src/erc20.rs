//! Recognised ERC-20 entry points
//!
//! Only `transfer(address,uint256)` and `approve(address,uint256)` are
//! understood. Both carry the token amount as argument 1.

use crate::policy::Selector;
use alloy_primitives::fixed_bytes;

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: Selector = fixed_bytes!("a9059cbb");

/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: Selector = fixed_bytes!("095ea7b3");

/// ERC-20 call that moves or authorises moving tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCall {
    /// `transfer(to, amount)`
    Transfer,
    /// `approve(spender, amount)`
    Approve,
}

impl TokenCall {
    /// Identify a selector, `None` for anything else
    pub fn from_selector(selector: &Selector) -> Option<Self> {
        if *selector == TRANSFER_SELECTOR {
            Some(Self::Transfer)
        } else if *selector == APPROVE_SELECTOR {
            Some(Self::Approve)
        } else {
            None
        }
    }

    /// Selector of this call
    pub fn selector(&self) -> Selector {
        match self {
            Self::Transfer => TRANSFER_SELECTOR,
            Self::Approve => APPROVE_SELECTOR,
        }
    }

    /// Position of the `amount` argument
    pub fn amount_index(&self) -> u64 {
        match self {
            Self::Transfer | Self::Approve => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_recognition() {
        assert_eq!(
            TokenCall::from_selector(&TRANSFER_SELECTOR),
            Some(TokenCall::Transfer)
        );
        assert_eq!(
            TokenCall::from_selector(&APPROVE_SELECTOR),
            Some(TokenCall::Approve)
        );
        assert_eq!(TokenCall::from_selector(&fixed_bytes!("23b872dd")), None);
        assert_eq!(TokenCall::Approve.amount_index(), 1);
    }
}
