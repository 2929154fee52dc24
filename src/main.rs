// region:    --- Imports
use crate::bidding::commands::BidProcessor;
use crate::cache::FastPathCache;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::notification::LogPushNotifier;
use crate::winning::closing::AuctionCloser;
use crate::winning::noshow::PaymentTimeoutProcessor;
use crate::winning::payment::{MockPaymentGateway, PaymentProcessor};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use message_broker::KafkaManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod cache;
mod config;
mod database;
mod error;
mod handlers;
mod message_broker;
mod notification;
mod query;
mod scheduler;
mod winning;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 정책 설정 로드
    let config = Arc::new(EngineConfig::from_env());
    info!("{:<12} --> 엔진 설정: {:?}", "Main", config);

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 토픽 준비
    let kafka_manager = Arc::new(KafkaManager::new());
    kafka_manager
        .create_topic(message_broker::BID_EVENTS_TOPIC, 5, 1)
        .await?;
    kafka_manager
        .create_topic(message_broker::AUCTION_EVENTS_TOPIC, 5, 1)
        .await?;
    info!("{:<12} --> Kafka 토픽 준비 완료", "Main");

    // 고속 경로 캐시
    let fast_path = Arc::new(FastPathCache::new(
        config.anti_snipe_threshold_ms(),
        config.anti_snipe_extension_ms(),
    ));

    // 처리기 조립
    let notifier = Arc::new(LogPushNotifier);
    let bid_processor = Arc::new(BidProcessor::new(
        Arc::clone(&fast_path),
        Arc::clone(&db_manager),
        kafka_manager.get_producer(),
    ));
    let payment_processor = Arc::new(PaymentProcessor::new(
        Arc::clone(&db_manager),
        Arc::new(MockPaymentGateway),
        notifier.clone(),
    ));
    let closer = Arc::new(AuctionCloser::new(
        Arc::clone(&db_manager),
        Arc::clone(&fast_path),
        kafka_manager.get_producer(),
        notifier.clone(),
        Arc::clone(&config),
    ));
    let timeout_processor = Arc::new(PaymentTimeoutProcessor::new(
        Arc::clone(&db_manager),
        notifier.clone(),
        Arc::clone(&config),
    ));

    // 마감 스윕과 결제 스윕 시작
    let closing_scheduler = scheduler::ClosingScheduler::new(closer, Arc::clone(&config));
    closing_scheduler.start().await;
    let payment_scheduler =
        scheduler::PaymentTimeoutScheduler::new(timeout_processor, Arc::clone(&config));
    payment_scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/auctions",
            post(handlers::handle_create_auction).get(handlers::handle_get_auctions),
        )
        .route("/bid", post(handlers::handle_bid))
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/bids", get(handlers::handle_get_bid_history))
        .route("/auctions/:id/winnings", get(handlers::handle_get_winnings))
        .route("/transactions/:id/pay", post(handlers::handle_pay))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20))
        .with_state((db_manager, bid_processor, payment_processor));

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
