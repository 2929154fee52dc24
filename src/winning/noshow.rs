/// 결제 기한 만료(노쇼) 처리
///
/// 기한이 지난 결제 대기 낙찰을 찾아 낙찰별 개별 트랜잭션으로 처리한다.
/// 1순위 노쇼는 경고 누적 후 2순위 승계를 시도하고, 승계가 불가능하면
/// 경매를 사후 유찰시킨다. 2순위 노쇼는 곧바로 유찰이다.
// region:    --- Imports
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::error::EngineError;
use crate::notification::PushNotifier;
use crate::query::handlers;
use crate::winning::model::{Winning, WinningStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- No Show Outcome

/// 노쇼 처리 트랜잭션의 결과
enum NoShowOutcome {
    /// 다른 처리 주체가 이미 전이시켰다
    Skipped,
    /// 2순위 승계 완료
    Promoted {
        buyer_id: i64,
        auction_id: i64,
        response_deadline: DateTime<Utc>,
    },
    /// 승계 불가, 경매 사후 유찰
    AuctionFailed { seller_id: Option<i64>, auction_id: i64 },
}

// endregion: --- No Show Outcome

// region:    --- Payment Timeout Processor

pub struct PaymentTimeoutProcessor {
    db_manager: Arc<DatabaseManager>,
    notifier: Arc<dyn PushNotifier>,
    config: Arc<EngineConfig>,
}

impl PaymentTimeoutProcessor {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        notifier: Arc<dyn PushNotifier>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            db_manager,
            notifier,
            config,
        }
    }

    /// 기한이 지난 결제 대기 낙찰을 모두 처리하고, 처리한 건수를 돌려준다
    pub async fn process_expired_payments(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let expired = handlers::get_expired_pending_winnings(&self.db_manager, now).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        info!(
            "{:<12} --> 결제 기한 만료 {}건 처리 시작",
            "NoShow",
            expired.len()
        );

        let mut processed = 0;
        for winning in expired {
            let winning_id = winning.id;
            match self.process_no_show_record(&winning, now).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(
                        "{:<12} --> 노쇼 처리 실패: winning={}, error={:?}",
                        "NoShow", winning_id, e
                    );
                }
            }
        }
        Ok(processed)
    }

    /// 낙찰 ID 기준 노쇼 처리 진입점
    pub async fn process_no_show(
        &self,
        winning_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let winning = handlers::get_winning(&self.db_manager, winning_id)
            .await?
            .ok_or(EngineError::WinningNotFound(winning_id))?;
        self.process_no_show_record(&winning, now).await
    }

    /// 낙찰 한 건 노쇼 처리, 이 프로세스가 전이를 따냈을 때만 true
    async fn process_no_show_record(
        &self,
        winning: &Winning,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let winning_id = winning.id;
        let auction_id = winning.auction_id;
        let bidder_id = winning.bidder_id;
        let first_amount = winning.bid_amount;
        let rank = winning.rank;
        let floor = self.config.auto_transfer_floor;
        let transfer_deadline = self.config.transfer_deadline();
        let warning_threshold = self.config.warning_threshold;

        let outcome = self
            .db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    // 선점: 아직 결제 대기여야 한다
                    let claimed = handlers::claim_winning_no_show(tx, winning_id).await?;
                    if !claimed {
                        return Ok(NoShowOutcome::Skipped);
                    }

                    // 판매자 통지용 거래 조회 (취소 전에 읽는다)
                    let transaction = handlers::get_awaiting_transaction(tx, auction_id).await?;
                    let seller_id = transaction.as_ref().map(|t| t.seller_id);

                    if rank == 1 {
                        // 1순위 노쇼는 경고를 누적한다
                        let warnings = handlers::add_user_warning(tx, bidder_id).await?;
                        if warnings >= warning_threshold {
                            warn!(
                                "{:<12} --> 경고 누적 한도 도달: user={}, count={}",
                                "NoShow", bidder_id, warnings
                            );
                        }

                        // 2순위가 승계 기준을 넘으면 결제 기한을 부여하고 거래를 넘긴다
                        let second = handlers::get_winning_by_rank(tx, auction_id, 2).await?;
                        if let Some(second) = second {
                            if second.status == WinningStatus::PendingPayment
                                && second.is_eligible_for_transfer(first_amount, floor)
                            {
                                let response_deadline = now + transfer_deadline;
                                handlers::promote_second_rank(tx, second.id, response_deadline)
                                    .await?;
                                handlers::transfer_transaction(
                                    tx,
                                    auction_id,
                                    second.bidder_id,
                                    second.bid_amount,
                                    response_deadline,
                                )
                                .await?;
                                handlers::update_auction_winner(tx, auction_id, second.bidder_id)
                                    .await?;
                                return Ok(NoShowOutcome::Promoted {
                                    buyer_id: second.bidder_id,
                                    auction_id,
                                    response_deadline,
                                });
                            }

                            // 기준 미달 2순위는 함께 유찰된다
                            if second.status == WinningStatus::PendingPayment {
                                handlers::mark_winning_failed(tx, second.id).await?;
                            }
                        }
                    }

                    // 승계 불가 (또는 2순위 본인 노쇼): 거래 취소, 경매 사후 유찰
                    handlers::cancel_transaction(tx, auction_id).await?;
                    handlers::mark_auction_failed(tx, auction_id).await?;
                    Ok::<NoShowOutcome, EngineError>(NoShowOutcome::AuctionFailed {
                        seller_id,
                        auction_id,
                    })
                })
            })
            .await?;

        // 커밋 후 알림
        match outcome {
            NoShowOutcome::Skipped => Ok(false),
            NoShowOutcome::Promoted {
                buyer_id,
                auction_id,
                response_deadline,
            } => {
                info!(
                    "{:<12} --> 2순위 승계: auction={}, buyer={}",
                    "NoShow", auction_id, buyer_id
                );
                self.notifier
                    .notify_transfer(buyer_id, auction_id, response_deadline)
                    .await;
                Ok(true)
            }
            NoShowOutcome::AuctionFailed {
                seller_id,
                auction_id,
            } => {
                info!(
                    "{:<12} --> 노쇼로 인한 사후 유찰: auction={}",
                    "NoShow", auction_id
                );
                if let Some(seller_id) = seller_id {
                    self.notifier.notify_auction_failed(seller_id, auction_id).await;
                }
                Ok(true)
            }
        }
    }

    /// 결제 기한 임박 거래에 안내를 보내고, 보낸 건수를 돌려준다
    pub async fn send_payment_reminders(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let window_end = now + self.config.reminder_window();
        let targets = handlers::get_reminder_targets(&self.db_manager, now, window_end).await?;

        let mut sent = 0;
        for transaction in targets {
            self.notifier
                .notify_payment_reminder(
                    transaction.buyer_id,
                    transaction.auction_id,
                    transaction.payment_deadline,
                )
                .await;
            handlers::mark_reminder_sent(&self.db_manager, transaction.id).await?;
            sent += 1;
        }
        if sent > 0 {
            info!("{:<12} --> 결제 기한 임박 안내 {}건 발송", "NoShow", sent);
        }
        Ok(sent)
    }
}

// endregion: --- Payment Timeout Processor
