//! Rewards Ledger - Database, price cache, and secret encryption layer

pub mod cache;
pub mod encryption;
pub mod sqlite;

pub use encryption::derive_machine_key;
pub use encryption::SecretEncryptor;
pub use sqlite::Database;
