//! Reward accrual models

use serde::{Deserialize, Serialize};

/// Source category of an accrued reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Referral,
    DailyTask,
    LevelBonus,
    Staking,
}

impl RewardCategory {
    /// Stable string form used as the ledger column value and in natural keys
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardCategory::Referral => "referral",
            RewardCategory::DailyTask => "daily_task",
            RewardCategory::LevelBonus => "level_bonus",
            RewardCategory::Staking => "staking",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "referral" => Some(RewardCategory::Referral),
            "daily_task" => Some(RewardCategory::DailyTask),
            "level_bonus" => Some(RewardCategory::LevelBonus),
            "staking" => Some(RewardCategory::Staking),
            _ => None,
        }
    }
}

impl std::fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending-reward row, keyed by (user, category)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    pub id: i64,
    pub user_id: i64,
    pub category: RewardCategory,
    /// Accrued, not-yet-claimed points; never negative
    pub pending_amount: f64,
    pub claimed: bool,
    /// Referring user swept together with the earner at settlement
    pub referrer_id: Option<i64>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregated unclaimed balance for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRewards {
    pub wallet_address: String,
    pub total_pending: f64,
    pub entries: Vec<RewardEntry>,
}

/// Outcome of applying one accrual event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualOutcome {
    pub entry: RewardEntry,
    /// False when the natural key had already been recorded (replay)
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in [
            RewardCategory::Referral,
            RewardCategory::DailyTask,
            RewardCategory::LevelBonus,
            RewardCategory::Staking,
        ] {
            assert_eq!(RewardCategory::from_str(cat.as_str()), Some(cat));
        }
        assert_eq!(RewardCategory::from_str("airdrop"), None);
    }
}
