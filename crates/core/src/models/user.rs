//! User-related models

use serde::{Deserialize, Serialize};

/// A registered wallet user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Wallet address, stored lowercase
    pub wallet_address: String,
    /// User that referred this one, if any
    pub referrer_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
