//! User row operations

use chrono::{DateTime, Utc};
use rewards_core::{normalize_wallet, Error, Result, User};
use sqlx::{SqliteConnection, SqliteExecutor};

/// Database row for a user
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    wallet_address: String,
    referrer_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            wallet_address: row.wallet_address,
            referrer_id: row.referrer_id,
            created_at: row.created_at,
        }
    }
}

/// Look up a user by wallet address (normalized before lookup)
pub async fn get_user<'e, E>(exec: E, wallet: &str) -> Result<Option<User>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT id, wallet_address, referrer_id, created_at
        FROM users
        WHERE wallet_address = ?
        "#,
    )
    .bind(normalize_wallet(wallet))
    .fetch_optional(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(User::from))
}

/// Fetch an existing user or create a fresh row for this wallet
pub async fn get_or_create_user(conn: &mut SqliteConnection, wallet: &str) -> Result<User> {
    let wallet = normalize_wallet(wallet);

    sqlx::query("INSERT OR IGNORE INTO users (wallet_address) VALUES (?)")
        .bind(&wallet)
        .execute(&mut *conn)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    get_user(&mut *conn, &wallet)
        .await?
        .ok_or_else(|| Error::DatabaseError(format!("user row missing after insert: {}", wallet)))
}

/// Record who referred a user (only if not already set)
pub async fn set_referrer<'e, E>(exec: E, user_id: i64, referrer_id: i64) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE users SET referrer_id = ?
        WHERE id = ? AND referrer_id IS NULL
        "#,
    )
    .bind(referrer_id)
    .bind(user_id)
    .execute(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}
