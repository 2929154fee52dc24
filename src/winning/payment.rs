/// 결제 처리
///
/// 검증(존재 -> 구매자 -> 상태 -> 기한) 후 게이트웨이 승인, 마지막으로
/// 선점 UPDATE 로 결제 완료를 전이시킨다. 만료 스윕과의 경쟁에서 진 결제는
/// 승인 이후라도 완료로 기록되지 않는다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::EngineError;
use crate::notification::PushNotifier;
use crate::query::handlers;
use crate::winning::model::{Transaction, TransactionStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Payment Gateway

/// 외부 결제 승인 경계
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// 결제 승인 요청
    async fn charge(&self, buyer_id: i64, amount: i64) -> Result<(), String>;
}

/// 항상 승인하는 게이트웨이, 외부 PG 연동 전까지의 기본 구현
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, buyer_id: i64, amount: i64) -> Result<(), String> {
        info!(
            "{:<12} --> 결제 승인: buyer={}, amount={}",
            "Gateway", buyer_id, amount
        );
        Ok(())
    }
}

// endregion: --- Payment Gateway

// region:    --- Payment Processor

pub struct PaymentProcessor {
    db_manager: Arc<DatabaseManager>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn PushNotifier>,
}

impl PaymentProcessor {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Self {
        Self {
            db_manager,
            gateway,
            notifier,
        }
    }

    /// 결제 처리
    pub async fn process_payment(
        &self,
        transaction_id: i64,
        user_id: i64,
    ) -> Result<Transaction, EngineError> {
        info!(
            "{:<12} --> 결제 요청: transaction={}, user={}",
            "Payment", transaction_id, user_id
        );

        let mut transaction = handlers::get_transaction(&self.db_manager, transaction_id)
            .await?
            .ok_or(EngineError::TransactionNotFound(transaction_id))?;

        if !transaction.is_buyer(user_id) {
            return Err(EngineError::NotTransactionBuyer {
                transaction_id,
                user_id,
            });
        }

        match transaction.status {
            TransactionStatus::Paid => return Err(EngineError::AlreadyPaid(transaction_id)),
            TransactionStatus::Cancelled => {
                return Err(EngineError::PaymentExpired(transaction_id))
            }
            TransactionStatus::AwaitingPayment => {}
        }

        let now = Utc::now();
        // 만료 스윕이 아직 돌기 전이라도 기한이 지난 결제는 받지 않는다
        if transaction.is_payment_expired(now) {
            return Err(EngineError::PaymentExpired(transaction_id));
        }

        self.gateway
            .charge(user_id, transaction.final_price)
            .await
            .map_err(|e| {
                error!(
                    "{:<12} --> 게이트웨이 승인 실패: transaction={}, error={}",
                    "Payment", transaction_id, e
                );
                EngineError::PaymentGatewayFailed(transaction_id)
            })?;

        // 선점 전이: 아직 결제 대기인 경우에만 완료로 기록된다
        let auction_id = transaction.auction_id;
        let buyer_id = transaction.buyer_id;
        let claimed = self
            .db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let claimed =
                        handlers::claim_transaction_paid(tx, transaction_id, now).await?;
                    if claimed {
                        handlers::mark_winning_paid(tx, auction_id, buyer_id).await?;
                        // 대기 중이던 2순위는 더 이상 기회가 없으므로 함께 정리한다
                        handlers::release_standby_winning(tx, auction_id, buyer_id).await?;
                    }
                    Ok::<bool, EngineError>(claimed)
                })
            })
            .await?;

        if !claimed {
            // 선점 실패: 중복 결제였는지 만료 처리와의 경쟁이었는지 구분한다
            let current = handlers::get_transaction(&self.db_manager, transaction_id)
                .await?
                .ok_or(EngineError::TransactionNotFound(transaction_id))?;
            return match current.status {
                TransactionStatus::Paid => Err(EngineError::AlreadyPaid(transaction_id)),
                _ => Err(EngineError::PaymentExpired(transaction_id)),
            };
        }

        info!(
            "{:<12} --> 결제 완료: transaction={}, auction={}",
            "Payment", transaction_id, auction_id
        );
        self.notifier
            .notify_payment_completed(transaction.seller_id, buyer_id, auction_id)
            .await;

        transaction.status = TransactionStatus::Paid;
        transaction.paid_at = Some(now);
        Ok(transaction)
    }
}

// endregion: --- Payment Processor
