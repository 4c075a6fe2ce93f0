//! Data models for rewards-ledger entities

mod claim;
mod reward;
mod user;

pub use claim::*;
pub use reward::*;
pub use user::*;
