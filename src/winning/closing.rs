/// 경매 마감 처리
///
/// 마감 시각이 지난 진행 중 경매를 찾아, 경매별 개별 트랜잭션으로
/// 상태 전이(선점 UPDATE)와 낙찰/거래 생성을 수행한다. 선점에 실패한
/// 경매는 다른 처리 주체가 이미 마감한 것이므로 조용히 건너뛴다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::cache::FastPathCache;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::error::EngineError;
use crate::message_broker::{KafkaProducer, AUCTION_EVENTS_TOPIC};
use crate::notification::{AuctionClosedMessage, PushNotifier};
use crate::query::handlers;
use crate::winning::model::{Transaction, Winning};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Close Outcome

/// 마감 트랜잭션의 결과, 커밋 후 알림과 브로드캐스트에 쓰인다
struct CloseOutcome {
    status: AuctionStatus,
    winner: Option<WinnerInfo>,
}

struct WinnerInfo {
    bidder_id: i64,
    amount: i64,
    response_deadline: DateTime<Utc>,
}

// endregion: --- Close Outcome

// region:    --- Auction Closer

pub struct AuctionCloser {
    db_manager: Arc<DatabaseManager>,
    cache: Arc<FastPathCache>,
    producer: Arc<KafkaProducer>,
    notifier: Arc<dyn PushNotifier>,
    config: Arc<EngineConfig>,
}

impl AuctionCloser {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        cache: Arc<FastPathCache>,
        producer: Arc<KafkaProducer>,
        notifier: Arc<dyn PushNotifier>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            db_manager,
            cache,
            producer,
            notifier,
            config,
        }
    }

    /// 마감 시각이 지난 경매를 모두 마감 처리하고, 처리한 건수를 돌려준다
    pub async fn close_expired_auctions(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let expired = handlers::get_expired_active_auctions(&self.db_manager, now).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        info!(
            "{:<12} --> 마감 대상 경매 {}건 처리 시작",
            "Closing",
            expired.len()
        );

        let mut closed = 0;
        for auction in expired {
            let auction_id = auction.id;
            // 한 경매의 실패가 나머지 마감을 막지 않는다
            match self.close_one(&auction, now).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(
                        "{:<12} --> 경매 마감 실패: auction={}, error={:?}",
                        "Closing", auction_id, e
                    );
                }
            }
        }
        Ok(closed)
    }

    /// 경매 한 건 마감, 이 프로세스가 전이를 따냈을 때만 true
    async fn close_one(&self, auction: &Auction, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let auction_id = auction.id;
        let seller_id = auction.seller_id;
        let payment_deadline = self.config.payment_deadline();

        let outcome = self
            .db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    // 선점이 먼저다: 진행 중이고 연장이 모두 반영된 종료 시각이
                    // 지났을 때만 닫힌다. 선점이 행을 잠그므로, 아직 커밋 전인
                    // 입찰의 경매 행 갱신은 이후 CLOSED 를 보고 롤백된다
                    let claimed = handlers::claim_auction_close(tx, auction_id, now, now).await?;
                    if !claimed {
                        return Ok(None);
                    }

                    // 선점 이후에 읽으므로 먼저 커밋된 입찰은 모두 순위에 반영된다
                    let top_two = handlers::get_top_two_bidders(tx, auction_id).await?;

                    // 입찰이 없으면 유찰
                    let Some(&(winner_id, winner_amount)) = top_two.first() else {
                        handlers::mark_auction_failed(tx, auction_id).await?;
                        return Ok(Some(CloseOutcome {
                            status: AuctionStatus::Failed,
                            winner: None,
                        }));
                    };

                    handlers::update_auction_winner(tx, auction_id, winner_id).await?;

                    // 1순위 낙찰과 거래 생성
                    let first = Winning::first_rank(
                        auction_id,
                        winner_id,
                        winner_amount,
                        payment_deadline,
                    );
                    let response_deadline = first
                        .response_deadline
                        .unwrap_or_else(|| now + payment_deadline);
                    handlers::insert_winning(tx, &first).await?;

                    let transaction = Transaction::new(
                        auction_id,
                        seller_id,
                        winner_id,
                        winner_amount,
                        response_deadline,
                    );
                    handlers::insert_transaction(tx, &transaction).await?;

                    // 2순위가 있으면 기한 없이 대기로 생성
                    if let Some(&(second_id, second_amount)) = top_two.get(1) {
                        let second = Winning::second_rank(auction_id, second_id, second_amount);
                        handlers::insert_winning(tx, &second).await?;
                    }

                    Ok::<Option<CloseOutcome>, EngineError>(Some(CloseOutcome {
                        status: AuctionStatus::Closed,
                        winner: Some(WinnerInfo {
                            bidder_id: winner_id,
                            amount: winner_amount,
                            response_deadline,
                        }),
                    }))
                })
            })
            .await?;

        let Some(outcome) = outcome else {
            // 다른 처리 주체가 먼저 마감했거나, 연장으로 종료 시각이 밀렸다
            return Ok(false);
        };

        // 커밋 후: 이후 입찰이 거부되도록 캐시 반영 후 제거
        self.cache.mark_closed(auction_id, outcome.status).await;
        self.cache.remove(auction_id).await;

        match &outcome.winner {
            Some(winner) => {
                info!(
                    "{:<12} --> 경매 마감: auction={}, winner={}, price={}",
                    "Closing", auction_id, winner.bidder_id, winner.amount
                );
                self.notifier
                    .notify_winning(winner.bidder_id, auction_id, winner.response_deadline)
                    .await;
            }
            None => {
                info!("{:<12} --> 경매 유찰: auction={}", "Closing", auction_id);
                self.notifier
                    .notify_auction_failed(auction.seller_id, auction_id)
                    .await;
            }
        }

        self.broadcast_closed(auction, &outcome).await;
        Ok(true)
    }

    async fn broadcast_closed(&self, auction: &Auction, outcome: &CloseOutcome) {
        let message = AuctionClosedMessage {
            auction_id: auction.id,
            status: outcome.status,
            final_price: outcome
                .winner
                .as_ref()
                .map(|w| w.amount)
                .unwrap_or(auction.current_price),
            winner_id: outcome.winner.as_ref().map(|w| w.bidder_id),
            total_bid_count: auction.total_bid_count,
        };
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("{:<12} --> 브로드캐스트 직렬화 오류: {:?}", "Closing", e);
                return;
            }
        };
        if let Err(e) = self
            .producer
            .send_message(AUCTION_EVENTS_TOPIC, &auction.id.to_string(), &payload)
            .await
        {
            error!("{:<12} --> 마감 브로드캐스트 실패: {}", "Closing", e);
        }
    }
}

// endregion: --- Auction Closer
