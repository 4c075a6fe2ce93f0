//! Rewards Server - REST surface over the accrual and settlement engines

pub mod config;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
