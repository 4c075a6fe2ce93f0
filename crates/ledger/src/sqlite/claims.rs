//! Claim history operations

use chrono::{DateTime, Utc};
use rewards_core::{ClaimHistoryRecord, ClaimStatus, Error, Result};
use sqlx::SqliteExecutor;

/// Database row for a claim history record
#[derive(Debug, sqlx::FromRow)]
struct ClaimHistoryRow {
    id: i64,
    user_id: i64,
    transaction_hash: String,
    amount_claimed: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl ClaimHistoryRow {
    fn into_record(self) -> Result<ClaimHistoryRecord> {
        let status = ClaimStatus::from_str(&self.status)
            .ok_or_else(|| Error::InvalidData(format!("unknown claim status: {}", self.status)))?;
        Ok(ClaimHistoryRecord {
            id: self.id,
            user_id: self.user_id,
            transaction_hash: self.transaction_hash,
            amount_claimed: self.amount_claimed,
            status,
            created_at: self.created_at,
        })
    }
}

/// Insert a claim history record.
///
/// The transaction hash carries a UNIQUE constraint; a duplicate insert
/// surfaces as `AlreadyClaimed` so racing finalize calls cannot both settle
/// the same on-chain claim.
pub async fn insert_claim_history<'e, E>(
    exec: E,
    user_id: i64,
    transaction_hash: &str,
    amount_claimed: f64,
    status: ClaimStatus,
) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO claim_history (user_id, transaction_hash, amount_claimed, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(transaction_hash)
    .bind(amount_claimed)
    .bind(status.as_str())
    .execute(exec)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .map_or(false, |d| d.is_unique_violation())
        {
            Error::AlreadyClaimed(transaction_hash.to_string())
        } else {
            Error::DatabaseError(e.to_string())
        }
    })?;

    Ok(result.last_insert_rowid())
}

/// Look up a claim by its on-chain transaction hash
pub async fn get_claim_by_hash<'e, E>(
    exec: E,
    transaction_hash: &str,
) -> Result<Option<ClaimHistoryRecord>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<ClaimHistoryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, transaction_hash, amount_claimed, status, created_at
        FROM claim_history
        WHERE transaction_hash = ?
        "#,
    )
    .bind(transaction_hash)
    .fetch_optional(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(ClaimHistoryRow::into_record).transpose()
}

/// List a user's claim history, newest first
pub async fn list_claim_history<'e, E>(exec: E, user_id: i64) -> Result<Vec<ClaimHistoryRecord>>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<ClaimHistoryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, transaction_hash, amount_claimed, status, created_at
        FROM claim_history
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(ClaimHistoryRow::into_record).collect()
}
