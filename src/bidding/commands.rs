/// 입찰 커맨드 처리
///
/// 고속 경로(메모리 중재) -> 내구 기록(RDB) -> 브로드캐스트(Kafka) 순서로
/// 처리된다. 응답은 중재 직후의 스냅샷으로 확정되고, 브로드캐스트 실패는
/// 입찰 결과에 영향을 주지 않는다.
// region:    --- Imports
use crate::bidding::model::{Bid, BidType};
use crate::cache::{AuctionState, BidSnapshot, FastPathCache};
use crate::database::DatabaseManager;
use crate::error::EngineError;
use crate::message_broker::{KafkaProducer, BID_EVENTS_TOPIC};
use crate::notification::BidAppliedMessage;
use crate::query::handlers;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub bid_type: BidType,
    /// DIRECT 입찰에서만 필수
    pub amount: Option<i64>,
    /// 전달 시도 단위의 고유 키, 재전송 시 동일 값
    pub idempotency_token: String,
}

// endregion: --- Commands

// region:    --- Bid Processor

pub struct BidProcessor {
    cache: Arc<FastPathCache>,
    db_manager: Arc<DatabaseManager>,
    producer: Arc<KafkaProducer>,
}

impl BidProcessor {
    pub fn new(
        cache: Arc<FastPathCache>,
        db_manager: Arc<DatabaseManager>,
        producer: Arc<KafkaProducer>,
    ) -> Self {
        Self {
            cache,
            db_manager,
            producer,
        }
    }

    /// 입찰 처리
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<BidSnapshot, EngineError> {
        info!(
            "{:<12} --> 입찰 요청: auction={}, bidder={}, type={:?}",
            "Command", cmd.auction_id, cmd.bidder_id, cmd.bid_type
        );

        // 캐시 미스면 경매 행으로 복원 후 입찰을 받는다
        if !self.cache.contains(cmd.auction_id).await {
            let auction = handlers::get_auction(&self.db_manager, cmd.auction_id)
                .await?
                .ok_or(EngineError::AuctionNotFound(cmd.auction_id))?;
            self.cache.rehydrate(AuctionState::rehydrate(&auction)).await;
        }

        // 경매별 잠금 아래 원자 중재
        let now_ms = Utc::now().timestamp_millis();
        let snapshot = self
            .cache
            .apply_bid_atomic(
                cmd.auction_id,
                cmd.bidder_id,
                cmd.amount,
                cmd.bid_type,
                &cmd.idempotency_token,
                now_ms,
            )
            .await?;

        // 내구 기록: 입찰 이력과 경매 행 갱신을 한 트랜잭션으로.
        // 토큰 충돌(중복 전달)이면 둘 다 건너뛴다.
        let bid = Bid::new(
            cmd.auction_id,
            cmd.bidder_id,
            snapshot.current_price,
            cmd.bid_type,
            cmd.idempotency_token.clone(),
        );
        let scheduled_end_time = ms_to_utc(snapshot.scheduled_end_ms);
        let result = self
            .db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let applied = handlers::insert_bid_idempotent(tx, &bid).await?;
                    if applied {
                        let updated = handlers::apply_bid_to_auction(
                            tx,
                            bid.auction_id,
                            snapshot.current_price,
                            snapshot.bid_increment,
                            scheduled_end_time,
                            snapshot.extension_count,
                            snapshot.total_bid_count,
                        )
                        .await?;
                        // 중재와 커밋 사이에 경매가 마감됐다면 입찰 이력까지 롤백
                        if !updated {
                            return Err(EngineError::AuctionNotActive(bid.auction_id));
                        }
                    }
                    Ok::<bool, EngineError>(applied)
                })
            })
            .await;

        let applied = match result {
            Ok(applied) => applied,
            Err(EngineError::AuctionNotActive(auction_id)) => {
                // 마감과의 경쟁에서 졌다: 낡은 고속 경로 상태를 버리고 거부한다
                warn!(
                    "{:<12} --> 마감된 경매로 입찰 기록 거부: auction={}",
                    "Command", auction_id
                );
                self.cache.remove(auction_id).await;
                return Err(EngineError::AuctionNotActive(auction_id));
            }
            Err(e) => return Err(e),
        };

        if !applied {
            // 중복 전달: 저장소 행 기준으로 고속 경로를 되돌리고 그 상태로 응답한다
            warn!(
                "{:<12} --> 중복 전달 감지, 기록 생략: auction={}, token={}",
                "Command", cmd.auction_id, cmd.idempotency_token
            );
            let auction = handlers::get_auction(&self.db_manager, cmd.auction_id)
                .await?
                .ok_or(EngineError::AuctionNotFound(cmd.auction_id))?;
            self.cache.remove(cmd.auction_id).await;
            self.cache.rehydrate(AuctionState::rehydrate(&auction)).await;
            return Ok(BidSnapshot::from_auction(&auction));
        }

        // 커밋 후 브로드캐스트, 실패는 로그만 남긴다
        self.broadcast_bid(cmd.auction_id, &snapshot, scheduled_end_time)
            .await;

        Ok(snapshot)
    }

    async fn broadcast_bid(
        &self,
        auction_id: i64,
        snapshot: &BidSnapshot,
        scheduled_end_time: DateTime<Utc>,
    ) {
        let message = BidAppliedMessage {
            auction_id,
            current_price: snapshot.current_price,
            bid_increment: snapshot.bid_increment,
            next_min_bid: snapshot.next_min_bid,
            scheduled_end_time,
            extended: snapshot.extended,
            extension_count: snapshot.extension_count,
            total_bid_count: snapshot.total_bid_count,
        };
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("{:<12} --> 브로드캐스트 직렬화 오류: {:?}", "Command", e);
                return;
            }
        };
        if let Err(e) = self
            .producer
            .send_message(BID_EVENTS_TOPIC, &auction_id.to_string(), &payload)
            .await
        {
            error!("{:<12} --> 입찰 브로드캐스트 실패: {}", "Command", e);
        }
    }
}

/// epoch 밀리초를 UTC 시각으로 변환
pub fn ms_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

// endregion: --- Bid Processor
