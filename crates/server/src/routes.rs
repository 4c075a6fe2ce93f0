//! REST routes for accrual events, claims, and balances

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rewards_core::{ClaimOffer, Error, PendingRewards};
use rewards_gateway::ChainGateway;
use rewards_ledger::sqlite;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

// ─── Error mapping ─────────────────────────────────────────────────

/// Wire form of every failure: a stable category plus a human message
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Handler-level error that maps the core taxonomy onto HTTP statuses
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidAmount(_)
            | Error::MissingFields(_)
            | Error::NothingToClaim
            | Error::InvalidData(_) => StatusCode::BAD_REQUEST,
            Error::UserNotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyClaimed(_) => StatusCode::CONFLICT,
            Error::ChainUnavailable(_)
            | Error::SettlementFailed(_)
            | Error::DatabaseError(_)
            | Error::EncryptionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.category(),
            message: self.0.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Require a non-empty string field, mapping absence to `MissingFields`
fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError(Error::MissingFields(name.to_string()))),
    }
}

// ─── Request/response bodies ───────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest {
    #[serde(default)]
    pub referrer_wallet: Option<String>,
    #[serde(default)]
    pub referred_wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBonusRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    pub level: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralResponse {
    pub referrer: rewards_core::AccrualOutcome,
    pub referred: rewards_core::AccrualOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub success: bool,
    pub entries_settled: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub price: f64,
    pub cached: bool,
}

// ─── Router ────────────────────────────────────────────────────────

/// Build the axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/rewards/referral", post(handle_referral))
        .route("/api/rewards/daily", post(handle_daily_task))
        .route("/api/rewards/level", post(handle_level_bonus))
        .route("/api/rewards/staking", post(handle_staking))
        .route("/api/rewards/{wallet}", get(handle_pending_rewards))
        .route("/api/claim/request", post(handle_claim_request))
        .route("/api/claim/finalize", post(handle_claim_finalize))
        .route("/api/claim/history/{wallet}", get(handle_claim_history))
        .route("/api/claim/onchain/{wallet}", get(handle_total_claimed))
        .route("/api/price", get(handle_price))
        .with_state(state)
}

// ─── Route handlers ────────────────────────────────────────────────

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_referral(
    State(state): State<AppState>,
    Json(req): Json<ReferralRequest>,
) -> ApiResult<ReferralResponse> {
    let referrer = require(req.referrer_wallet, "referrerWallet")?;
    let referred = require(req.referred_wallet, "referredWallet")?;

    let (referrer_outcome, referred_outcome) =
        state.accrual.record_referral(&referrer, &referred).await?;

    Ok(Json(ReferralResponse {
        referrer: referrer_outcome,
        referred: referred_outcome,
    }))
}

async fn handle_daily_task(
    State(state): State<AppState>,
    Json(req): Json<WalletRequest>,
) -> ApiResult<rewards_core::AccrualOutcome> {
    let wallet = require(req.wallet_address, "walletAddress")?;
    let outcome = state.accrual.record_daily_task_today(&wallet).await?;
    Ok(Json(outcome))
}

async fn handle_level_bonus(
    State(state): State<AppState>,
    Json(req): Json<LevelBonusRequest>,
) -> ApiResult<rewards_core::AccrualOutcome> {
    let wallet = require(req.wallet_address, "walletAddress")?;
    let platform = require(req.platform, "platform")?;
    let level = req
        .level
        .ok_or_else(|| ApiError(Error::MissingFields("level".to_string())))?;

    let outcome = state
        .accrual
        .record_level_bonus(&wallet, &platform, level)
        .await?;
    Ok(Json(outcome))
}

async fn handle_staking(
    State(state): State<AppState>,
    Json(req): Json<StakingRequest>,
) -> ApiResult<rewards_core::AccrualOutcome> {
    let wallet = require(req.wallet_address, "walletAddress")?;
    let milestone = require(req.milestone, "milestone")?;
    let amount = req
        .amount
        .ok_or_else(|| ApiError(Error::MissingFields("amount".to_string())))?;

    let outcome = state
        .accrual
        .record_staking_milestone(&wallet, &milestone, amount)
        .await?;
    Ok(Json(outcome))
}

async fn handle_pending_rewards(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<PendingRewards> {
    let user = sqlite::get_user(state.db.pool(), &wallet)
        .await?
        .ok_or_else(|| ApiError(Error::UserNotFound(wallet.clone())))?;

    let entries = sqlite::unclaimed_entries(state.db.pool(), user.id).await?;
    let total_pending = sqlite::sum_unclaimed_rewards(state.db.pool(), user.id).await?;

    Ok(Json(PendingRewards {
        wallet_address: user.wallet_address,
        total_pending,
        entries,
    }))
}

async fn handle_claim_request(
    State(state): State<AppState>,
    Json(req): Json<WalletRequest>,
) -> ApiResult<ClaimOffer> {
    let wallet = require(req.wallet_address, "walletAddress")?;
    let offer = state.coordinator.request_claim(&wallet).await?;
    Ok(Json(offer))
}

async fn handle_claim_finalize(
    State(state): State<AppState>,
    Json(req): Json<FinalizeRequest>,
) -> ApiResult<FinalizeResponse> {
    let wallet = require(req.wallet_address, "walletAddress")?;
    let transaction_hash = require(req.transaction_hash, "transactionHash")?;
    let amount = req
        .amount
        .ok_or_else(|| ApiError(Error::MissingFields("amount".to_string())))?;

    let entries_settled = state
        .coordinator
        .finalize_claim(&wallet, &transaction_hash, amount)
        .await?;

    Ok(Json(FinalizeResponse {
        success: true,
        entries_settled,
    }))
}

async fn handle_claim_history(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Vec<rewards_core::ClaimHistoryRecord>> {
    let user = sqlite::get_user(state.db.pool(), &wallet)
        .await?
        .ok_or_else(|| ApiError(Error::UserNotFound(wallet.clone())))?;

    let history = sqlite::list_claim_history(state.db.pool(), user.id).await?;
    Ok(Json(history))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalClaimedResponse {
    pub wallet_address: String,
    pub total_claimed: f64,
}

async fn handle_total_claimed(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<TotalClaimedResponse> {
    let user = sqlite::get_user(state.db.pool(), &wallet)
        .await?
        .ok_or_else(|| ApiError(Error::UserNotFound(wallet.clone())))?;

    let total_claimed = state
        .coordinator
        .total_claimed_on_chain(&user.wallet_address)
        .await?;

    Ok(Json(TotalClaimedResponse {
        wallet_address: user.wallet_address,
        total_claimed,
    }))
}

async fn handle_price(State(state): State<AppState>) -> ApiResult<PriceResponse> {
    let now = Instant::now();
    if let Some(price) = state.price_cache.get_fresh(now) {
        debug!("Price cache hit: {}", price);
        return Ok(Json(PriceResponse {
            price,
            cached: true,
        }));
    }

    let price = state.gateway.get_token_price().await?;
    state.price_cache.store(price, now);
    Ok(Json(PriceResponse {
        price,
        cached: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::InvalidAmount(-1.0), StatusCode::BAD_REQUEST),
            (Error::MissingFields("walletAddress".into()), StatusCode::BAD_REQUEST),
            (Error::NothingToClaim, StatusCode::BAD_REQUEST),
            (Error::UserNotFound("0xdead".into()), StatusCode::NOT_FOUND),
            (Error::AlreadyClaimed("0xabc".into()), StatusCode::CONFLICT),
            (Error::ChainUnavailable("offline".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::SettlementFailed("rollback".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::DatabaseError("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_require_rejects_missing_and_blank() {
        assert!(require(None, "walletAddress").is_err());
        assert!(require(Some("  ".to_string()), "walletAddress").is_err());
        assert_eq!(
            require(Some("0xAAA".to_string()), "walletAddress").unwrap(),
            "0xAAA"
        );
    }
}
