//! HTTP client for the chain relay service

mod client;

pub use client::HttpChainGateway;
