/// 주기 스윕 스케줄러
///
/// 마감 스윕은 짧은 주기로 돌며 종료 시각이 지난 경매를 마감하고,
/// 결제 스윕은 더 긴 주기로 기한 만료 낙찰과 기한 임박 안내를 처리한다.
/// 스윕 자체는 멱등하다. 한 틱이 실패해도 다음 틱이 이어받는다.
// region:    --- Imports
use crate::config::EngineConfig;
use crate::winning::closing::AuctionCloser;
use crate::winning::noshow::PaymentTimeoutProcessor;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Closing Scheduler
/// 경매 마감 스케줄러
pub struct ClosingScheduler {
    closer: Arc<AuctionCloser>,
    config: Arc<EngineConfig>,
}

impl ClosingScheduler {
    pub fn new(closer: Arc<AuctionCloser>, config: Arc<EngineConfig>) -> Self {
        Self { closer, config }
    }

    /// 마감 스윕 시작
    pub async fn start(&self) {
        let closer = Arc::clone(&self.closer);
        let sweep_millis = self.config.closing_sweep_millis;
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_millis(sweep_millis));
            loop {
                interval.tick().await;
                match closer.close_expired_auctions(Utc::now()).await {
                    Ok(0) => {}
                    Ok(closed) => {
                        debug!("{:<12} --> 경매 {}건 마감 완료", "Scheduler", closed);
                    }
                    Err(e) => {
                        error!("{:<12} --> 마감 스윕 오류: {:?}", "Scheduler", e);
                    }
                }
            }
        });
    }
}
// endregion: --- Closing Scheduler

// region:    --- Payment Timeout Scheduler
/// 결제 기한 스케줄러 - 만료 처리와 기한 임박 안내
pub struct PaymentTimeoutScheduler {
    processor: Arc<PaymentTimeoutProcessor>,
    config: Arc<EngineConfig>,
}

impl PaymentTimeoutScheduler {
    pub fn new(processor: Arc<PaymentTimeoutProcessor>, config: Arc<EngineConfig>) -> Self {
        Self { processor, config }
    }

    /// 결제 스윕 시작
    pub async fn start(&self) {
        let processor = Arc::clone(&self.processor);
        let sweep_secs = self.config.payment_sweep_secs;
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(sweep_secs));
            loop {
                interval.tick().await;
                let now = Utc::now();
                if let Err(e) = processor.process_expired_payments(now).await {
                    error!("{:<12} --> 결제 만료 스윕 오류: {:?}", "Scheduler", e);
                }
                if let Err(e) = processor.send_payment_reminders(now).await {
                    error!("{:<12} --> 결제 안내 스윕 오류: {:?}", "Scheduler", e);
                }
            }
        });
    }
}
// endregion: --- Payment Timeout Scheduler
