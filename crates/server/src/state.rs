//! Application state shared across request handlers

use crate::Config;
use rewards_engine::{AccrualEngine, SettlementCoordinator};
use rewards_gateway::HttpChainGateway;
use rewards_ledger::cache::PriceCache;
use rewards_ledger::Database;
use std::sync::Arc;

/// Shared state handed to every axum handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub accrual: Arc<AccrualEngine>,
    pub coordinator: Arc<SettlementCoordinator<Arc<HttpChainGateway>>>,
    pub gateway: Arc<HttpChainGateway>,
    /// Shared token price cache for the /api/price endpoint
    pub price_cache: Arc<PriceCache>,
}

impl AppState {
    /// Wire the engines and gateway together from config + an open database
    pub fn new(config: &Config, db: Database, signing_key: &str) -> Self {
        let db = Arc::new(db);
        let gateway = Arc::new(HttpChainGateway::new(&config.gateway_url, signing_key));

        Self {
            accrual: Arc::new(AccrualEngine::new(db.clone(), config.amounts.clone())),
            coordinator: Arc::new(SettlementCoordinator::new(
                db.clone(),
                gateway.clone(),
                config.points_divisor,
            )),
            gateway,
            price_cache: Arc::new(PriceCache::new(config.price_ttl)),
            db,
        }
    }
}
