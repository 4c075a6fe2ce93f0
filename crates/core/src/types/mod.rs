//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};

/// Reward points as tracked in the ledger (for clarity in function signatures)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Points(pub f64);

impl Points {
    pub fn new(amount: f64) -> Self {
        Points(amount)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Convert points to claimable tokens using the settlement divisor
    pub fn to_tokens(&self, divisor: f64) -> TokenAmount {
        TokenAmount(self.0 / divisor)
    }
}

/// On-chain token amount offered for claim
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount(pub f64);

impl TokenAmount {
    pub fn new(amount: f64) -> Self {
        TokenAmount(amount)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// Normalize a wallet address for storage and lookup.
///
/// Addresses arrive mixed-case from wallet providers; the ledger keys on the
/// lowercase form so `0xAbC…` and `0xabc…` resolve to the same user.
pub fn normalize_wallet(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wallet_lowercases_and_trims() {
        assert_eq!(
            normalize_wallet(" 0xAbCdEf0123456789 "),
            "0xabcdef0123456789"
        );
    }

    #[test]
    fn test_points_to_tokens_divisor() {
        let tokens = Points::new(80.0).to_tokens(10.0);
        assert_eq!(tokens.as_f64(), 8.0);
    }
}
