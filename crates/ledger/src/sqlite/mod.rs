//! SQLite ledger management

mod claims;
mod connection;
mod credentials;
mod rewards;
mod users;

pub use claims::*;
pub use connection::Database;
pub use credentials::*;
pub use rewards::*;
pub use users::*;
