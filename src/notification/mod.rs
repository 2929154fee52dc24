/// 실시간 브로드캐스트 페이로드와 개인 알림 발송 경계
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auction::model::AuctionStatus;

// endregion: --- Imports

// region:    --- Broadcast Messages

/// 입찰 반영 브로드캐스트 - 구독자 화면 갱신용 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidAppliedMessage {
    pub auction_id: i64,
    pub current_price: i64,
    pub bid_increment: i64,
    pub next_min_bid: i64,
    pub scheduled_end_time: DateTime<Utc>,
    pub extended: bool,
    pub extension_count: i32,
    pub total_bid_count: i32,
}

/// 경매 마감 브로드캐스트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionClosedMessage {
    pub auction_id: i64,
    pub status: AuctionStatus,
    pub final_price: i64,
    pub winner_id: Option<i64>,
    pub total_bid_count: i32,
}

// endregion: --- Broadcast Messages

// region:    --- Push Notifier

/// 개인 알림 발송 경계, 실패해도 상태 전이에는 영향을 주지 않는다
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// 낙찰 안내 (결제 기한 포함)
    async fn notify_winning(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>);

    /// 2순위 승계 안내
    async fn notify_transfer(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>);

    /// 유찰 안내 (판매자)
    async fn notify_auction_failed(&self, seller_id: i64, auction_id: i64);

    /// 결제 완료 안내 (판매자, 구매자)
    async fn notify_payment_completed(&self, seller_id: i64, buyer_id: i64, auction_id: i64);

    /// 결제 기한 임박 안내
    async fn notify_payment_reminder(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>);
}

/// 로그로만 남기는 발송기, 외부 푸시 연동 전까지의 기본 구현
pub struct LogPushNotifier;

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn notify_winning(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>) {
        info!(
            "{:<12} --> 낙찰 안내: user={}, auction={}, 결제 기한={}",
            "Notify", user_id, auction_id, deadline
        );
    }

    async fn notify_transfer(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>) {
        info!(
            "{:<12} --> 2순위 승계 안내: user={}, auction={}, 결제 기한={}",
            "Notify", user_id, auction_id, deadline
        );
    }

    async fn notify_auction_failed(&self, seller_id: i64, auction_id: i64) {
        info!(
            "{:<12} --> 유찰 안내: seller={}, auction={}",
            "Notify", seller_id, auction_id
        );
    }

    async fn notify_payment_completed(&self, seller_id: i64, buyer_id: i64, auction_id: i64) {
        info!(
            "{:<12} --> 결제 완료 안내: seller={}, buyer={}, auction={}",
            "Notify", seller_id, buyer_id, auction_id
        );
    }

    async fn notify_payment_reminder(&self, user_id: i64, auction_id: i64, deadline: DateTime<Utc>) {
        info!(
            "{:<12} --> 결제 기한 임박 안내: user={}, auction={}, 기한={}",
            "Notify", user_id, auction_id, deadline
        );
    }
}

// endregion: --- Push Notifier
