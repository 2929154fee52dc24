/// 경매 도메인 모델
// region:    --- Imports
use crate::auction::policy;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction Status
/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    /// 입찰 진행 중
    Active,
    /// 경매 종료 (낙찰자 결정)
    Closed,
    /// 유찰 (입찰자 없음 또는 승계 실패)
    Failed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Closed => "CLOSED",
            AuctionStatus::Failed => "FAILED",
        }
    }

    /// 저장소 문자열에서 복원
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(AuctionStatus::Active),
            "CLOSED" => Some(AuctionStatus::Closed),
            "FAILED" => Some(AuctionStatus::Failed),
            _ => None,
        }
    }
}
// endregion: --- Auction Status

// region:    --- Auction Model
/// 경매 모델
/// 진행 중(ACTIVE)에는 입찰 처리기가 단독으로 상태를 변경하고,
/// 종료 시점부터는 종료 스케줄러가 소유권을 가진다
#[derive(Debug, Clone, Serialize)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_price: i64,
    pub current_price: i64,
    pub instant_buy_price: Option<i64>,
    pub bid_increment: i64,
    pub scheduled_end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub extension_count: i32,
    pub total_bid_count: i32,
    pub status: AuctionStatus,
    pub winner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// 새 경매 생성
    /// 시작가로 현재가를 초기화하고 입찰 단위를 가격 구간에서 계산한다
    pub fn new(
        seller_id: i64,
        title: String,
        description: String,
        category: String,
        start_price: i64,
        instant_buy_price: Option<i64>,
        duration_hours: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            seller_id,
            title,
            description,
            category,
            start_price,
            current_price: start_price,
            instant_buy_price,
            bid_increment: policy::increment_for_price(start_price),
            scheduled_end_time: now + Duration::hours(duration_hours),
            actual_end_time: None,
            extension_count: 0,
            total_bid_count: 0,
            status: AuctionStatus::Active,
            winner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 다음 입찰 가능 최소 금액
    pub fn next_min_bid_price(&self) -> i64 {
        self.current_price + self.bid_increment
    }

    /// 진행 중 여부
    pub fn is_active(&self) -> bool {
        self.status == AuctionStatus::Active
    }
}
// endregion: --- Auction Model

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 새 경매는 시작가 = 현재가, 상태 ACTIVE
    #[test]
    fn test_new_auction() {
        let auction = Auction::new(
            1,
            "테스트 경매".to_string(),
            "설명".to_string(),
            "ELECTRONICS".to_string(),
            10_000,
            Some(500_000),
            24,
        );
        assert_eq!(auction.current_price, 10_000);
        assert_eq!(auction.bid_increment, 1_000);
        assert_eq!(auction.status, AuctionStatus::Active);
        assert_eq!(auction.total_bid_count, 0);
        assert_eq!(auction.next_min_bid_price(), 11_000);
    }

    /// 상태 문자열 왕복 확인
    #[test]
    fn test_status_parse() {
        assert_eq!(AuctionStatus::parse("ACTIVE"), Some(AuctionStatus::Active));
        assert_eq!(AuctionStatus::parse("CLOSED"), Some(AuctionStatus::Closed));
        assert_eq!(AuctionStatus::parse("FAILED"), Some(AuctionStatus::Failed));
        assert_eq!(AuctionStatus::parse("BIDDING"), None);
    }
}
// endregion: --- Tests
