//! Chain relay HTTP client with bearer-key authentication

use crate::chain::ChainGateway;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, Response,
};
use rewards_core::{normalize_wallet, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// HTTP client for the chain relay service.
///
/// The relay holds the claim contract's operator role; this client
/// authenticates with the signing key and asks the relay to read balances or
/// submit allowance transactions on our behalf.
pub struct HttpChainGateway {
    http: Client,
    base_url: String,
    signing_key: String,
}

/// Response from `GET /claimable/{wallet}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimableResponse {
    claimable: f64,
}

/// Response from `GET /claimed/{wallet}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalClaimedResponse {
    total_claimed: f64,
}

/// Request body for `POST /claimable`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetClaimableRequest<'a> {
    wallet_address: &'a str,
    amount: f64,
}

/// Response from `POST /claimable`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetClaimableResponse {
    transaction_hash: String,
}

/// Response from `GET /price`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPriceResponse {
    price: f64,
}

impl HttpChainGateway {
    /// Create a new gateway client against the given relay base URL
    pub fn new(base_url: &str, signing_key: &str) -> Self {
        let http = Client::builder()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key: signing_key.to_string(),
        }
    }

    /// Default headers for relay requests
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.signing_key))
                .map_err(|e| Error::ChainUnavailable(e.to_string()))?,
        );
        Ok(headers)
    }

    /// Map a non-2xx relay response to `ChainUnavailable`
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Relay request failed: HTTP {} — {}", status, body);
            return Err(Error::ChainUnavailable(format!("HTTP {}: {}", status, body)));
        }
        Ok(response)
    }
}

impl ChainGateway for HttpChainGateway {
    /// Read the wallet's current claimable allowance
    #[instrument(skip(self))]
    async fn get_claimable(&self, wallet: &str) -> Result<f64> {
        let url = format!("{}/claimable/{}", self.base_url, normalize_wallet(wallet));

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers()?)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let data: ClaimableResponse = response.json().await.map_err(|e| {
            error!("Failed to parse claimable response: {}", e);
            Error::ChainUnavailable(e.to_string())
        })?;

        debug!("Claimable for {}: {}", wallet, data.claimable);
        Ok(data.claimable)
    }

    /// Read the wallet's lifetime claimed total
    #[instrument(skip(self))]
    async fn get_total_claimed(&self, wallet: &str) -> Result<f64> {
        let url = format!("{}/claimed/{}", self.base_url, normalize_wallet(wallet));

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers()?)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let data: TotalClaimedResponse = response.json().await.map_err(|e| {
            error!("Failed to parse total-claimed response: {}", e);
            Error::ChainUnavailable(e.to_string())
        })?;

        Ok(data.total_claimed)
    }

    /// Submit a signed allowance transaction for the wallet
    #[instrument(skip(self))]
    async fn set_claimable(&self, wallet: &str, amount: f64) -> Result<String> {
        let url = format!("{}/claimable", self.base_url);
        let wallet = normalize_wallet(wallet);

        debug!("Setting claimable for {} to {}", wallet, amount);

        let body = SetClaimableRequest {
            wallet_address: &wallet,
            amount,
        };

        let response = self
            .http
            .post(&url)
            .headers(self.default_headers()?)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let data: SetClaimableResponse = response.json().await.map_err(|e| {
            error!("Failed to parse set-claimable response: {}", e);
            Error::ChainUnavailable(e.to_string())
        })?;

        debug!(
            "Claimable set for {}: {} (tx {})",
            wallet, amount, data.transaction_hash
        );
        Ok(data.transaction_hash)
    }

    /// Fetch the settlement token spot price
    #[instrument(skip(self))]
    async fn get_token_price(&self) -> Result<f64> {
        let url = format!("{}/price", self.base_url);

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers()?)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let data: TokenPriceResponse = response.json().await.map_err(|e| {
            error!("Failed to parse price response: {}", e);
            Error::ChainUnavailable(e.to_string())
        })?;

        Ok(data.price)
    }
}
