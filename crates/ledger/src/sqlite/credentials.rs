//! Encrypted credential storage (gateway signing key)

use crate::encryption::EncryptedSecret;
use rewards_core::{Error, Result};
use sqlx::SqliteExecutor;

/// Store (or replace) an encrypted credential under a name
pub async fn store_credential<'e, E>(
    exec: E,
    name: &str,
    encrypted: &EncryptedSecret,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO credentials (name, ciphertext, iv)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            ciphertext = excluded.ciphertext,
            iv = excluded.iv,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(name)
    .bind(&encrypted.ciphertext)
    .bind(&encrypted.iv[..])
    .execute(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Load an encrypted credential by name
pub async fn load_credential<'e, E>(exec: E, name: &str) -> Result<Option<EncryptedSecret>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(Vec<u8>, Vec<u8>)> = sqlx::query_as(
        "SELECT ciphertext, iv FROM credentials WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(exec)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    match row {
        Some((ciphertext, iv)) => {
            let iv: [u8; 12] = iv
                .try_into()
                .map_err(|_| Error::InvalidData("credential IV must be 12 bytes".to_string()))?;
            Ok(Some(EncryptedSecret { ciphertext, iv }))
        }
        None => Ok(None),
    }
}
