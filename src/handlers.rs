// region:    --- Imports
use crate::auction::model::Auction;
use crate::auction::policy;
use crate::bidding::commands::{ms_to_utc, BidProcessor, PlaceBidCommand};
use crate::database::DatabaseManager;
use crate::error::EngineError;
use crate::query;
use crate::winning::payment::PaymentProcessor;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 핸들러 공유 상태: (저장소, 입찰 처리기, 결제 처리기)
pub type AppState = (Arc<DatabaseManager>, Arc<BidProcessor>, Arc<PaymentProcessor>);

// region:    --- Command Handlers

/// 경매 등록 요청
#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub seller_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub start_price: i64,
    pub instant_buy_price: Option<i64>,
    pub duration_hours: i64,
}

/// 경매 등록 처리
pub async fn handle_create_auction(
    State((db_manager, _, _)): State<AppState>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<impl IntoResponse, EngineError> {
    info!("{:<12} --> 경매 등록 요청: {}", "Command", req.title);

    if !policy::is_allowed_duration(req.duration_hours) {
        return Err(EngineError::InvalidDuration(req.duration_hours));
    }

    let auction = Auction::new(
        req.seller_id,
        req.title,
        req.description,
        req.category,
        req.start_price,
        req.instant_buy_price,
        req.duration_hours,
    );
    let id = query::handlers::insert_auction(&db_manager, &auction).await?;

    Ok(Json(serde_json::json!({
        "id": id,
        "current_price": auction.current_price,
        "bid_increment": auction.bid_increment,
        "next_min_bid": auction.next_min_bid_price(),
        "scheduled_end_time": auction.scheduled_end_time,
    })))
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State((_, bid_processor, _)): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, EngineError> {
    let auction_id = cmd.auction_id;
    let snapshot = bid_processor.place_bid(cmd).await?;

    Ok(Json(serde_json::json!({
        "auction_id": auction_id,
        "current_price": snapshot.current_price,
        "bid_increment": snapshot.bid_increment,
        "next_min_bid": snapshot.next_min_bid,
        "scheduled_end_time": ms_to_utc(snapshot.scheduled_end_ms),
        "extended": snapshot.extended,
        "extension_count": snapshot.extension_count,
        "total_bid_count": snapshot.total_bid_count,
    })))
}

/// 결제 요청
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub user_id: i64,
}

/// 결제 요청 처리
pub async fn handle_pay(
    State((_, _, payment_processor)): State<AppState>,
    Path(transaction_id): Path<i64>,
    Json(req): Json<PayRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let transaction = payment_processor
        .process_payment(transaction_id, req.user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "transaction_id": transaction.id,
        "auction_id": transaction.auction_id,
        "final_price": transaction.final_price,
        "status": transaction.status.as_str(),
        "paid_at": transaction.paid_at,
    })))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 진행 중인 경매 목록 조회
pub async fn handle_get_auctions(
    State((db_manager, _, _)): State<AppState>,
) -> Result<impl IntoResponse, EngineError> {
    info!("{:<12} --> 진행 중 경매 목록 조회", "HandlerQuery");
    let auctions = query::handlers::get_active_auctions(&db_manager).await?;
    Ok(Json(auctions))
}

/// 경매 조회
pub async fn handle_get_auction(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, EngineError> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    let auction = query::handlers::get_auction(&db_manager, auction_id)
        .await?
        .ok_or(EngineError::AuctionNotFound(auction_id))?;
    Ok(Json(auction))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, EngineError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    let history = query::handlers::get_bid_history(&db_manager, auction_id).await?;
    Ok(Json(history))
}

/// 경매 낙찰 기록 조회
pub async fn handle_get_winnings(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, EngineError> {
    info!("{:<12} --> 낙찰 기록 조회 id: {}", "HandlerQuery", auction_id);
    let winnings = query::handlers::get_winnings_by_auction(&db_manager, auction_id).await?;
    Ok(Json(winnings))
}

// endregion: --- Query Handlers
