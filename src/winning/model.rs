/// 낙찰 / 거래 도메인 모델
// region:    --- Imports
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Winning Status
/// 낙찰 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinningStatus {
    /// 결제 대기 중 (2순위는 승계 전까지 기한 없이 대기)
    PendingPayment,
    /// 결제 완료
    Paid,
    /// 미결제 (노쇼)
    NoShow,
    /// 유찰
    Failed,
}

impl WinningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinningStatus::PendingPayment => "PENDING_PAYMENT",
            WinningStatus::Paid => "PAID",
            WinningStatus::NoShow => "NO_SHOW",
            WinningStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_PAYMENT" => Some(WinningStatus::PendingPayment),
            "PAID" => Some(WinningStatus::Paid),
            "NO_SHOW" => Some(WinningStatus::NoShow),
            "FAILED" => Some(WinningStatus::Failed),
            _ => None,
        }
    }
}
// endregion: --- Winning Status

// region:    --- Winning Model
/// 낙찰 모델 - 1, 2순위 낙찰 후보 정보
/// 경매당 1순위, 2순위 행은 각각 최대 하나만 존재한다
#[derive(Debug, Clone, Serialize)]
pub struct Winning {
    pub id: i64,
    pub auction_id: i64,
    pub rank: i32,
    pub bidder_id: i64,
    pub bid_amount: i64,
    pub status: WinningStatus,
    pub response_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Winning {
    /// 1순위 낙찰자 생성 - 결제 기한이 바로 부여된다
    pub fn first_rank(auction_id: i64, bidder_id: i64, bid_amount: i64, deadline: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            auction_id,
            rank: 1,
            bidder_id,
            bid_amount,
            status: WinningStatus::PendingPayment,
            response_deadline: Some(now + deadline),
            created_at: now,
        }
    }

    /// 2순위 낙찰 후보 생성 - 기한 없이 대기, 승계 시에만 기한 부여
    pub fn second_rank(auction_id: i64, bidder_id: i64, bid_amount: i64) -> Self {
        Self {
            id: 0,
            auction_id,
            rank: 2,
            bidder_id,
            bid_amount,
            status: WinningStatus::PendingPayment,
            response_deadline: None,
            created_at: Utc::now(),
        }
    }

    /// 2순위가 자동 승계 대상인지 확인 (1순위 금액의 floor 비율 이상)
    pub fn is_eligible_for_transfer(&self, first_rank_amount: i64, floor: f64) -> bool {
        if self.rank != 2 {
            return false;
        }
        let threshold = (first_rank_amount as f64 * floor) as i64;
        self.bid_amount >= threshold
    }
}
// endregion: --- Winning Model

// region:    --- Transaction Status
/// 거래 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// 결제 대기
    AwaitingPayment,
    /// 결제 완료
    Paid,
    /// 취소 (노쇼, 유찰)
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::AwaitingPayment => "AWAITING_PAYMENT",
            TransactionStatus::Paid => "PAID",
            TransactionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AWAITING_PAYMENT" => Some(TransactionStatus::AwaitingPayment),
            "PAID" => Some(TransactionStatus::Paid),
            "CANCELLED" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}
// endregion: --- Transaction Status

// region:    --- Transaction Model
/// 거래 모델 - 낙찰 확정부터 결제까지의 결제 레코드
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub auction_id: i64,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub final_price: i64,
    pub status: TransactionStatus,
    pub payment_deadline: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// 1순위 낙찰 확정 시 거래 생성
    pub fn new(
        auction_id: i64,
        seller_id: i64,
        buyer_id: i64,
        final_price: i64,
        payment_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            auction_id,
            seller_id,
            buyer_id,
            final_price,
            status: TransactionStatus::AwaitingPayment,
            payment_deadline,
            paid_at: None,
            reminder_sent: false,
            created_at: Utc::now(),
        }
    }

    /// 해당 사용자가 이 거래의 구매자인지 확인
    pub fn is_buyer(&self, user_id: i64) -> bool {
        self.buyer_id == user_id
    }

    /// 결제 대기 중인지 확인
    pub fn is_awaiting_payment(&self) -> bool {
        self.status == TransactionStatus::AwaitingPayment
    }

    /// 결제 기한 만료 여부
    pub fn is_payment_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.payment_deadline
    }
}
// endregion: --- Transaction Model

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 1순위 낙찰은 기한과 함께 결제 대기로 생성된다
    #[test]
    fn test_first_rank_winning() {
        let winning = Winning::first_rank(1, 10, 10_000, Duration::hours(3));
        assert_eq!(winning.rank, 1);
        assert_eq!(winning.status, WinningStatus::PendingPayment);
        assert!(winning.response_deadline.is_some());
    }

    /// 2순위 낙찰 후보는 기한 없이 대기한다
    #[test]
    fn test_second_rank_winning() {
        let winning = Winning::second_rank(1, 20, 9_500);
        assert_eq!(winning.rank, 2);
        assert_eq!(winning.status, WinningStatus::PendingPayment);
        assert!(winning.response_deadline.is_none());
    }

    /// 승계 기준: 1순위 10,000원 대비 9,500원(95%)은 승계, 8,000원(80%)은 탈락
    #[test]
    fn test_transfer_eligibility() {
        let eligible = Winning::second_rank(1, 20, 9_500);
        assert!(eligible.is_eligible_for_transfer(10_000, 0.9));

        let ineligible = Winning::second_rank(1, 20, 8_000);
        assert!(!ineligible.is_eligible_for_transfer(10_000, 0.9));
    }

    /// 1순위 행은 승계 판정 대상이 아니다
    #[test]
    fn test_first_rank_never_transferable() {
        let first = Winning::first_rank(1, 10, 10_000, Duration::hours(3));
        assert!(!first.is_eligible_for_transfer(10_000, 0.9));
    }

    /// 거래 구매자 / 기한 판정
    #[test]
    fn test_transaction_checks() {
        let deadline = Utc::now() + Duration::hours(3);
        let tx = Transaction::new(1, 100, 10, 10_000, deadline);
        assert!(tx.is_buyer(10));
        assert!(!tx.is_buyer(11));
        assert!(tx.is_awaiting_payment());
        assert!(!tx.is_payment_expired(Utc::now()));
        assert!(tx.is_payment_expired(deadline + Duration::seconds(1)));
    }
}
// endregion: --- Tests
