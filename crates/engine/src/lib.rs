//! Rewards Engine - accrual and claim settlement logic

pub mod accrual;
pub mod settlement;

pub use accrual::{AccrualEngine, RewardAmounts};
pub use settlement::SettlementCoordinator;
