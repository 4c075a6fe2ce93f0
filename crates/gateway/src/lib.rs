//! Rewards Gateway - chain relay trait and HTTP client

pub mod chain;
pub mod http;

pub use chain::ChainGateway;
pub use http::HttpChainGateway;
