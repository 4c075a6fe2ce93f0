//! Claim settlement models

use serde::{Deserialize, Serialize};

/// Final status of a settled claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Completed,
    Failed,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Completed => "completed",
            ClaimStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(ClaimStatus::Completed),
            "failed" => Some(ClaimStatus::Failed),
            _ => None,
        }
    }
}

/// Response to a claim request: the amount now claimable on-chain.
///
/// `transaction_hash` is present only when this call pushed a fresh allowance;
/// a re-request that short-circuited on an existing allowance omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOffer {
    pub claimable_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Immutable record of one settled claim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimHistoryRecord {
    pub id: i64,
    pub user_id: i64,
    pub transaction_hash: String,
    pub amount_claimed: f64,
    pub status: ClaimStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
