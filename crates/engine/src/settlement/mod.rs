//! Claim Settlement Coordinator
//!
//! Aggregates a user's pending rewards into an on-chain claimable amount and,
//! once the user's claim transaction is confirmed, settles the ledger: all
//! swept entries are zeroed and one history record is written, atomically.
//!
//! Per-user claim cycle: NoPendingClaim → ClaimableSet → ClaimSubmitted →
//! Settled. ClaimableSet is re-entrant-safe (a second request returns the
//! existing allowance untouched); Settled is terminal until fresh accrual.

use rewards_core::{ClaimOffer, ClaimStatus, Error, Points, Result};
use rewards_gateway::ChainGateway;
use rewards_ledger::{sqlite, Database};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default points-to-token divisor
pub const DEFAULT_POINTS_DIVISOR: f64 = 10.0;

/// Coordinates claim requests and on-chain claim settlement
pub struct SettlementCoordinator<G> {
    db: Arc<Database>,
    gateway: G,
    divisor: f64,
}

impl<G: ChainGateway> SettlementCoordinator<G> {
    pub fn new(db: Arc<Database>, gateway: G, divisor: f64) -> Self {
        Self {
            db,
            gateway,
            divisor: if divisor > 0.0 {
                divisor
            } else {
                DEFAULT_POINTS_DIVISOR
            },
        }
    }

    /// Offer the user's pending rewards for on-chain claim.
    ///
    /// If the wallet already has an unclaimed allowance on-chain, that amount
    /// is returned unchanged — overwriting it would strand the earlier offer.
    /// Otherwise the unclaimed total is converted to tokens and pushed to the
    /// claim contract.
    #[instrument(skip(self))]
    pub async fn request_claim(&self, wallet: &str) -> Result<ClaimOffer> {
        let user = sqlite::get_user(self.db.pool(), wallet)
            .await?
            .ok_or_else(|| Error::UserNotFound(wallet.to_string()))?;

        let on_chain = self.gateway.get_claimable(&user.wallet_address).await?;
        if on_chain > 0.0 {
            debug!(
                "Wallet {} already has {} claimable on-chain, not overwriting",
                user.wallet_address, on_chain
            );
            return Ok(ClaimOffer {
                claimable_amount: on_chain,
                transaction_hash: None,
            });
        }

        let total = sqlite::sum_unclaimed_rewards(self.db.pool(), user.id).await?;
        let claimable = Points::new(total).to_tokens(self.divisor).as_f64();
        if claimable <= 0.0 {
            return Err(Error::NothingToClaim);
        }

        let transaction_hash = self
            .gateway
            .set_claimable(&user.wallet_address, claimable)
            .await?;

        info!(
            "Claimable set for {}: {} tokens ({} points, tx {})",
            user.wallet_address, claimable, total, transaction_hash
        );

        Ok(ClaimOffer {
            claimable_amount: claimable,
            transaction_hash: Some(transaction_hash),
        })
    }

    /// Settle a confirmed on-chain claim.
    ///
    /// Runs as one ledger transaction: every unclaimed entry where the user
    /// is earner or referrer is zeroed and a completed history record is
    /// inserted. Any failure rolls the whole unit back — partial resets are
    /// never observable. Returns the number of entries settled.
    #[instrument(skip(self))]
    pub async fn finalize_claim(
        &self,
        wallet: &str,
        transaction_hash: &str,
        amount: f64,
    ) -> Result<u64> {
        if wallet.trim().is_empty() {
            return Err(Error::MissingFields("walletAddress".to_string()));
        }
        if transaction_hash.trim().is_empty() {
            return Err(Error::MissingFields("transactionHash".to_string()));
        }
        if amount <= 0.0 {
            return Err(Error::MissingFields("amount".to_string()));
        }

        let user = sqlite::get_user(self.db.pool(), wallet)
            .await?
            .ok_or_else(|| Error::UserNotFound(wallet.to_string()))?;

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| Error::SettlementFailed(e.to_string()))?;

        let settled = sqlite::reset_unclaimed_rewards(&mut *tx, user.id)
            .await
            .map_err(|e| Error::SettlementFailed(e.to_string()))?;

        sqlite::insert_claim_history(
            &mut *tx,
            user.id,
            transaction_hash,
            amount,
            ClaimStatus::Completed,
        )
        .await
        .map_err(|e| match e {
            // Duplicate hash is a domain conflict, not a storage failure
            Error::AlreadyClaimed(_) => e,
            other => Error::SettlementFailed(other.to_string()),
        })?;

        tx.commit()
            .await
            .map_err(|e| Error::SettlementFailed(e.to_string()))?;

        if settled == 0 {
            warn!(
                "Finalized claim {} for {} but no entries were pending",
                transaction_hash, user.wallet_address
            );
        } else {
            info!(
                "Settled {} entries for {} (tx {}, {} tokens)",
                settled, user.wallet_address, transaction_hash, amount
            );
        }

        Ok(settled)
    }

    /// Lifetime total the wallet has withdrawn from the claim contract
    pub async fn total_claimed_on_chain(&self, wallet: &str) -> Result<f64> {
        self.gateway.get_total_claimed(wallet).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::{AccrualEngine, RewardAmounts};
    use rewards_core::Result;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the chain relay
    #[derive(Default)]
    struct MockGateway {
        claimable: Mutex<HashMap<String, f64>>,
        total_claimed: Mutex<HashMap<String, f64>>,
        fail: AtomicBool,
        tx_counter: AtomicU64,
    }

    impl MockGateway {
        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(Error::ChainUnavailable("relay offline".to_string()))
            } else {
                Ok(())
            }
        }

        /// Simulate the user withdrawing their allowance on-chain
        fn withdraw(&self, wallet: &str) -> f64 {
            let mut claimable = self.claimable.lock().unwrap();
            let amount = claimable.remove(wallet).unwrap_or(0.0);
            *self
                .total_claimed
                .lock()
                .unwrap()
                .entry(wallet.to_string())
                .or_insert(0.0) += amount;
            amount
        }
    }

    impl ChainGateway for MockGateway {
        async fn get_claimable(&self, wallet: &str) -> Result<f64> {
            self.check()?;
            Ok(*self.claimable.lock().unwrap().get(wallet).unwrap_or(&0.0))
        }

        async fn get_total_claimed(&self, wallet: &str) -> Result<f64> {
            self.check()?;
            Ok(*self
                .total_claimed
                .lock()
                .unwrap()
                .get(wallet)
                .unwrap_or(&0.0))
        }

        async fn set_claimable(&self, wallet: &str, amount: f64) -> Result<String> {
            self.check()?;
            self.claimable
                .lock()
                .unwrap()
                .insert(wallet.to_string(), amount);
            let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("0xtx{:04}", n))
        }

        async fn get_token_price(&self) -> Result<f64> {
            self.check()?;
            Ok(1.0)
        }
    }

    async fn setup() -> (Arc<Database>, AccrualEngine, SettlementCoordinator<Arc<MockGateway>>, Arc<MockGateway>) {
        let db = Arc::new(Database::connect_in_memory().await.unwrap());
        let gateway = Arc::new(MockGateway::default());
        let engine = AccrualEngine::new(db.clone(), RewardAmounts::default());
        let coordinator = SettlementCoordinator::new(db.clone(), gateway.clone(), 10.0);
        (db, engine, coordinator, gateway)
    }

    /// Referral 50 + daily 30 points, divisor 10, claims 8 tokens.
    #[tokio::test]
    async fn test_full_claim_cycle() {
        let (db, engine, coordinator, gateway) = setup().await;

        engine
            .accrue(
                "0xAAA",
                rewards_core::RewardCategory::Referral,
                50.0,
                "referral:referrer:0xbbb",
                None,
            )
            .await
            .unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        engine.record_daily_task("0xAAA", day).await.unwrap();

        let offer = coordinator.request_claim("0xAAA").await.unwrap();
        assert_eq!(offer.claimable_amount, 8.0);
        let tx_hash = offer.transaction_hash.expect("fresh offer carries a tx hash");

        gateway.withdraw("0xaaa");
        let settled = coordinator
            .finalize_claim("0xAAA", &tx_hash, 8.0)
            .await
            .unwrap();
        assert_eq!(settled, 2);

        let user = sqlite::get_user(db.pool(), "0xAAA").await.unwrap().unwrap();
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), user.id).await.unwrap(),
            0.0
        );

        let history = sqlite::list_claim_history(db.pool(), user.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].transaction_hash, tx_hash);
        assert_eq!(history[0].amount_claimed, 8.0);
        assert_eq!(history[0].status, ClaimStatus::Completed);
    }

    #[tokio::test]
    async fn test_request_claim_is_idempotent_before_finalize() {
        let (_db, engine, coordinator, _gateway) = setup().await;

        engine
            .record_staking_milestone("0xAAA", "m1", 80.0)
            .await
            .unwrap();

        let first = coordinator.request_claim("0xAAA").await.unwrap();
        assert_eq!(first.claimable_amount, 8.0);
        assert!(first.transaction_hash.is_some());

        // Second request sees the on-chain allowance and leaves it untouched
        let second = coordinator.request_claim("0xAAA").await.unwrap();
        assert_eq!(second.claimable_amount, 8.0);
        assert!(second.transaction_hash.is_none());
    }

    #[tokio::test]
    async fn test_request_claim_with_no_pending_rewards() {
        let (db, _engine, coordinator, _gateway) = setup().await;

        // Known user, empty ledger
        let mut conn = db.pool().acquire().await.unwrap();
        sqlite::get_or_create_user(&mut conn, "0xAAA").await.unwrap();
        drop(conn);

        let err = coordinator.request_claim("0xAAA").await.unwrap_err();
        assert!(matches!(err, Error::NothingToClaim));
    }

    #[tokio::test]
    async fn test_request_claim_unknown_wallet() {
        let (_db, _engine, coordinator, _gateway) = setup().await;

        let err = coordinator.request_claim("0xDEAD").await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_finalize_missing_fields_leaves_ledger_unmodified() {
        let (db, engine, coordinator, _gateway) = setup().await;

        engine
            .record_staking_milestone("0xAAA", "m1", 80.0)
            .await
            .unwrap();

        let err = coordinator.finalize_claim("0xAAA", "", 8.0).await.unwrap_err();
        assert!(matches!(err, Error::MissingFields(_)));
        let err = coordinator.finalize_claim("", "0xabc", 8.0).await.unwrap_err();
        assert!(matches!(err, Error::MissingFields(_)));
        let err = coordinator.finalize_claim("0xAAA", "0xabc", 0.0).await.unwrap_err();
        assert!(matches!(err, Error::MissingFields(_)));

        let user = sqlite::get_user(db.pool(), "0xAAA").await.unwrap().unwrap();
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), user.id).await.unwrap(),
            80.0
        );
        assert!(sqlite::list_claim_history(db.pool(), user.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_finalize_unknown_wallet_performs_no_writes() {
        let (db, _engine, coordinator, _gateway) = setup().await;

        let err = coordinator
            .finalize_claim("0xDEAD", "0xabc", 8.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));

        assert!(sqlite::get_claim_by_hash(db.pool(), "0xabc")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_transaction_hash_is_already_claimed() {
        let (db, engine, coordinator, _gateway) = setup().await;

        engine
            .record_staking_milestone("0xAAA", "m1", 80.0)
            .await
            .unwrap();
        coordinator.finalize_claim("0xAAA", "0xabc", 8.0).await.unwrap();

        // Fresh accrual starts a new cycle, but the old hash cannot settle it
        engine
            .record_staking_milestone("0xAAA", "m2", 40.0)
            .await
            .unwrap();
        let err = coordinator
            .finalize_claim("0xAAA", "0xabc", 4.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyClaimed(_)));

        // The rolled-back reset left the new cycle's points pending
        let user = sqlite::get_user(db.pool(), "0xAAA").await.unwrap().unwrap();
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), user.id).await.unwrap(),
            40.0
        );
        let history = sqlite::list_claim_history(db.pool(), user.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_does_not_touch_ledger() {
        let (db, engine, coordinator, gateway) = setup().await;

        engine
            .record_staking_milestone("0xAAA", "m1", 80.0)
            .await
            .unwrap();

        gateway.set_failing(true);
        let err = coordinator.request_claim("0xAAA").await.unwrap_err();
        assert!(matches!(err, Error::ChainUnavailable(_)));

        let user = sqlite::get_user(db.pool(), "0xAAA").await.unwrap().unwrap();
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), user.id).await.unwrap(),
            80.0
        );
    }

    #[tokio::test]
    async fn test_settlement_sweeps_referrer_linked_entries() {
        let (db, engine, coordinator, _gateway) = setup().await;

        // 0xAAA referred 0xBBB: referrer earns 50, referred earns 25 with a
        // referrer link back to 0xAAA
        engine.record_referral("0xAAA", "0xBBB").await.unwrap();

        let offer = coordinator.request_claim("0xAAA").await.unwrap();
        // 50 own + 25 referrer-linked, divisor 10
        assert_eq!(offer.claimable_amount, 7.5);

        coordinator.finalize_claim("0xAAA", "0xabc", 7.5).await.unwrap();

        let referrer = sqlite::get_user(db.pool(), "0xAAA").await.unwrap().unwrap();
        let referred = sqlite::get_user(db.pool(), "0xBBB").await.unwrap().unwrap();
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), referrer.id).await.unwrap(),
            0.0
        );
        // The referred user's linked entry was swept with the referrer's claim
        assert_eq!(
            sqlite::sum_unclaimed_rewards(db.pool(), referred.id).await.unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn test_new_cycle_starts_after_fresh_accrual() {
        let (_db, engine, coordinator, gateway) = setup().await;

        engine
            .record_staking_milestone("0xAAA", "m1", 80.0)
            .await
            .unwrap();
        let offer = coordinator.request_claim("0xAAA").await.unwrap();
        gateway.withdraw("0xaaa");
        coordinator
            .finalize_claim("0xAAA", &offer.transaction_hash.unwrap(), 8.0)
            .await
            .unwrap();

        // Settled cycle is terminal
        let err = coordinator.request_claim("0xAAA").await.unwrap_err();
        assert!(matches!(err, Error::NothingToClaim));

        // Fresh accrual opens a new cycle
        engine
            .record_staking_milestone("0xAAA", "m2", 20.0)
            .await
            .unwrap();
        let offer = coordinator.request_claim("0xAAA").await.unwrap();
        assert_eq!(offer.claimable_amount, 2.0);
    }
}
