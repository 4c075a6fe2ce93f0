//! Reward entry and accrual journal operations

use chrono::{DateTime, Utc};
use rewards_core::{Error, Result, RewardCategory, RewardEntry};
use sqlx::{SqliteConnection, SqliteExecutor};

/// Database row for a reward entry
#[derive(Debug, sqlx::FromRow)]
struct RewardEntryRow {
    id: i64,
    user_id: i64,
    category: String,
    pending_amount: f64,
    claimed: i32,
    referrer_id: Option<i64>,
    updated_at: DateTime<Utc>,
}

impl RewardEntryRow {
    fn into_entry(self) -> Result<RewardEntry> {
        let category = RewardCategory::from_str(&self.category)
            .ok_or_else(|| Error::InvalidData(format!("unknown reward category: {}", self.category)))?;
        Ok(RewardEntry {
            id: self.id,
            user_id: self.user_id,
            category,
            pending_amount: self.pending_amount,
            claimed: self.claimed != 0,
            referrer_id: self.referrer_id,
            updated_at: self.updated_at,
        })
    }
}

/// Record an accrual event by its natural key.
///
/// Returns `false` when the key was already present — the caller must treat
/// that as a replay and not credit the reward again.
pub async fn record_accrual_event<'e, E>(
    exec: E,
    natural_key: &str,
    user_id: i64,
    category: RewardCategory,
    amount: f64,
) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO accrual_events (natural_key, user_id, category, amount)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(natural_key)
    .bind(user_id)
    .bind(category.as_str())
    .bind(amount)
    .execute(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

/// Create a pending reward entry for (user, category) or add to the existing
/// one. A previously settled entry comes back alive with `claimed = 0`.
pub async fn upsert_reward_entry(
    conn: &mut SqliteConnection,
    user_id: i64,
    category: RewardCategory,
    delta: f64,
    referrer_id: Option<i64>,
) -> Result<RewardEntry> {
    sqlx::query(
        r#"
        INSERT INTO reward_entries (user_id, category, pending_amount, claimed, referrer_id)
        VALUES (?, ?, ?, 0, ?)
        ON CONFLICT(user_id, category) DO UPDATE SET
            pending_amount = pending_amount + excluded.pending_amount,
            claimed = 0,
            referrer_id = COALESCE(excluded.referrer_id, reward_entries.referrer_id),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(category.as_str())
    .bind(delta)
    .bind(referrer_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    get_reward_entry(&mut *conn, user_id, category)
        .await?
        .ok_or_else(|| Error::DatabaseError("reward entry missing after upsert".to_string()))
}

/// Fetch a single reward entry by its (user, category) key
pub async fn get_reward_entry<'e, E>(
    exec: E,
    user_id: i64,
    category: RewardCategory,
) -> Result<Option<RewardEntry>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<RewardEntryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, category, pending_amount, claimed, referrer_id, updated_at
        FROM reward_entries
        WHERE user_id = ? AND category = ?
        "#,
    )
    .bind(user_id)
    .bind(category.as_str())
    .fetch_optional(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(RewardEntryRow::into_entry).transpose()
}

/// Sum of all unclaimed points where the user is earner or referring party.
/// This is exactly the amount next offered for claim.
pub async fn sum_unclaimed_rewards<'e, E>(exec: E, user_id: i64) -> Result<f64>
where
    E: SqliteExecutor<'e>,
{
    let row: (f64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(pending_amount), 0.0)
        FROM reward_entries
        WHERE claimed = 0 AND (user_id = ? OR referrer_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.0)
}

/// List the unclaimed entries backing a user's pending total
pub async fn unclaimed_entries<'e, E>(exec: E, user_id: i64) -> Result<Vec<RewardEntry>>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<RewardEntryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, category, pending_amount, claimed, referrer_id, updated_at
        FROM reward_entries
        WHERE claimed = 0 AND (user_id = ? OR referrer_id = ?)
        ORDER BY category
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(RewardEntryRow::into_entry).collect()
}

/// Zero out every unclaimed entry where the user is earner or referrer.
/// Returns the number of entries settled.
pub async fn reset_unclaimed_rewards<'e, E>(exec: E, user_id: i64) -> Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE reward_entries
        SET pending_amount = 0, claimed = 1, updated_at = CURRENT_TIMESTAMP
        WHERE claimed = 0 AND (user_id = ? OR referrer_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .execute(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}
