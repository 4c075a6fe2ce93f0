//! Chain gateway contract consumed by the settlement engine

use rewards_core::Result;
use std::future::Future;
use std::sync::Arc;

/// Read/write access to the on-chain claim contract via a relay service.
///
/// Every failure surfaces as `ChainUnavailable`; no gateway call mutates the
/// ledger, so a failed call never needs ledger-side compensation.
pub trait ChainGateway: Send + Sync {
    /// Current unclaimed allowance set for this wallet
    fn get_claimable(&self, wallet: &str) -> impl Future<Output = Result<f64>> + Send;

    /// Lifetime total the wallet has already withdrawn
    fn get_total_claimed(&self, wallet: &str) -> impl Future<Output = Result<f64>> + Send;

    /// Set the wallet's claimable allowance; returns the transaction hash
    fn set_claimable(
        &self,
        wallet: &str,
        amount: f64,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Spot price of the settlement token
    fn get_token_price(&self) -> impl Future<Output = Result<f64>> + Send;
}

/// Shared gateway handles delegate to the inner implementation
impl<G: ChainGateway> ChainGateway for Arc<G> {
    async fn get_claimable(&self, wallet: &str) -> Result<f64> {
        self.as_ref().get_claimable(wallet).await
    }

    async fn get_total_claimed(&self, wallet: &str) -> Result<f64> {
        self.as_ref().get_total_claimed(wallet).await
    }

    async fn set_claimable(&self, wallet: &str, amount: f64) -> Result<String> {
        self.as_ref().set_claimable(wallet, amount).await
    }

    async fn get_token_price(&self) -> Result<f64> {
        self.as_ref().get_token_price().await
    }
}
