//! Reward Accrual Engine
//!
//! Turns qualifying events (referral signups, daily task completions, level
//! bonuses, staking milestones) into pending reward entries. Every event
//! carries a natural key recorded in the accrual journal, so replays return
//! the existing entry unchanged instead of double-crediting.

use chrono::NaiveDate;
use rewards_core::{normalize_wallet, AccrualOutcome, Error, Result, RewardCategory};
use rewards_ledger::{sqlite, Database};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Fixed point amounts credited per event category
#[derive(Debug, Clone)]
pub struct RewardAmounts {
    /// Credited to the referring user per signup
    pub referral_bonus: f64,
    /// Credited to the newly referred user
    pub referral_signup_bonus: f64,
    /// Credited per completed daily task
    pub daily_task: f64,
    /// Credited per level reached on a social platform
    pub level_bonus: f64,
}

impl Default for RewardAmounts {
    fn default() -> Self {
        Self {
            referral_bonus: 50.0,
            referral_signup_bonus: 25.0,
            daily_task: 30.0,
            level_bonus: 100.0,
        }
    }
}

/// Applies accrual events to the ledger
pub struct AccrualEngine {
    db: Arc<Database>,
    amounts: RewardAmounts,
}

impl AccrualEngine {
    pub fn new(db: Arc<Database>, amounts: RewardAmounts) -> Self {
        Self { db, amounts }
    }

    /// Apply one accrual event.
    ///
    /// Journal insert and entry upsert run in a single transaction: either
    /// the event is recorded and credited, or neither happened. A replayed
    /// natural key commits nothing and returns the existing entry with
    /// `applied: false`.
    #[instrument(skip(self))]
    pub async fn accrue(
        &self,
        wallet: &str,
        category: RewardCategory,
        amount: f64,
        natural_key: &str,
        referrer: Option<&str>,
    ) -> Result<AccrualOutcome> {
        if amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        let user = sqlite::get_or_create_user(&mut tx, wallet).await?;

        let referrer_id = match referrer {
            Some(referrer_wallet) => {
                let referrer_user = sqlite::get_or_create_user(&mut tx, referrer_wallet).await?;
                sqlite::set_referrer(&mut *tx, user.id, referrer_user.id).await?;
                Some(referrer_user.id)
            }
            None => None,
        };

        let applied =
            sqlite::record_accrual_event(&mut *tx, natural_key, user.id, category, amount).await?;

        let entry = if applied {
            sqlite::upsert_reward_entry(&mut tx, user.id, category, amount, referrer_id).await?
        } else {
            debug!("Replayed accrual event, no credit: {}", natural_key);
            sqlite::get_reward_entry(&mut *tx, user.id, category)
                .await?
                .ok_or_else(|| {
                    Error::DatabaseError(format!(
                        "journal has {} but no reward entry exists",
                        natural_key
                    ))
                })?
        };

        tx.commit()
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        if applied {
            info!(
                "Accrued {} {} points for {} ({})",
                amount, category, user.wallet_address, natural_key
            );
        }

        Ok(AccrualOutcome { entry, applied })
    }

    /// Credit both sides of a referral signup.
    ///
    /// Idempotent per referred wallet: signing up again with a different
    /// referrer replays the same natural keys and credits nothing.
    pub async fn record_referral(
        &self,
        referrer_wallet: &str,
        referred_wallet: &str,
    ) -> Result<(AccrualOutcome, AccrualOutcome)> {
        let referrer = normalize_wallet(referrer_wallet);
        let referred = normalize_wallet(referred_wallet);
        if referrer == referred {
            return Err(Error::InvalidData("self-referral is not allowed".to_string()));
        }

        let referred_outcome = self
            .accrue(
                &referred,
                RewardCategory::Referral,
                self.amounts.referral_signup_bonus,
                &format!("referral:signup:{}", referred),
                Some(&referrer),
            )
            .await?;

        let referrer_outcome = self
            .accrue(
                &referrer,
                RewardCategory::Referral,
                self.amounts.referral_bonus,
                &format!("referral:referrer:{}", referred),
                None,
            )
            .await?;

        Ok((referrer_outcome, referred_outcome))
    }

    /// Credit a completed daily task; one credit per user per UTC day
    pub async fn record_daily_task(&self, wallet: &str, day: NaiveDate) -> Result<AccrualOutcome> {
        let wallet = normalize_wallet(wallet);
        let key = format!("daily:{}:{}", wallet, day.format("%Y-%m-%d"));
        self.accrue(
            &wallet,
            RewardCategory::DailyTask,
            self.amounts.daily_task,
            &key,
            None,
        )
        .await
    }

    /// Credit today's daily task using the UTC clock
    pub async fn record_daily_task_today(&self, wallet: &str) -> Result<AccrualOutcome> {
        self.record_daily_task(wallet, chrono::Utc::now().date_naive())
            .await
    }

    /// Credit a level-up bonus; one credit per user per level per platform
    pub async fn record_level_bonus(
        &self,
        wallet: &str,
        platform: &str,
        level: u32,
    ) -> Result<AccrualOutcome> {
        let wallet = normalize_wallet(wallet);
        let key = format!("level:{}:{}:{}", wallet, platform, level);
        self.accrue(
            &wallet,
            RewardCategory::LevelBonus,
            self.amounts.level_bonus,
            &key,
            None,
        )
        .await
    }

    /// Credit a staking milestone with a caller-supplied point amount
    pub async fn record_staking_milestone(
        &self,
        wallet: &str,
        milestone: &str,
        amount: f64,
    ) -> Result<AccrualOutcome> {
        let wallet = normalize_wallet(wallet);
        let key = format!("staking:{}:{}", wallet, milestone);
        self.accrue(&wallet, RewardCategory::Staking, amount, &key, None)
            .await
    }
}
