/// 입찰 도메인 모델
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Bid Type
/// 입찰 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidType {
    /// 원터치 입찰 - 현재가 + 입찰단위로 자동 입찰
    OneTouch,
    /// 금액 직접 지정 - 사용자가 입찰 금액을 직접 입력
    Direct,
}

impl BidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidType::OneTouch => "ONE_TOUCH",
            BidType::Direct => "DIRECT",
        }
    }

    /// 저장소 문자열에서 복원
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE_TOUCH" => Some(BidType::OneTouch),
            "DIRECT" => Some(BidType::Direct),
            _ => None,
        }
    }
}
// endregion: --- Bid Type

// region:    --- Bid Model
/// 입찰 모델 (저장 후 불변)
/// idempotency_token 은 전달 시도 단위의 고유 키로,
/// 동일 토큰의 중복 전달은 하나의 입찰 이력만 남긴다
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub bid_type: BidType,
    pub idempotency_token: String,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// 확정 금액으로 새 입찰 생성
    pub fn new(
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        bid_type: BidType,
        idempotency_token: String,
    ) -> Self {
        Self {
            id: 0,
            auction_id,
            bidder_id,
            amount,
            bid_type,
            idempotency_token,
            created_at: Utc::now(),
        }
    }
}
// endregion: --- Bid Model
