/// 엔진 오류 정의
/// 검증 오류는 호출자에게 즉시 반환, 인프라 오류는 스윕에서 다음 틱에 재시도
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Engine Error
#[derive(Debug, Error)]
pub enum EngineError {
    /// 경매를 찾을 수 없음
    #[error("경매를 찾을 수 없습니다. (경매 ID: {0})")]
    AuctionNotFound(i64),

    /// 종료되었거나 진행 중이 아닌 경매
    #[error("이미 종료된 경매입니다. (경매 ID: {0})")]
    AuctionNotActive(i64),

    /// 입찰 금액이 최소 입찰 가능 금액 미만
    #[error("입찰 금액({amount}원)이 최소 입찰 가능 금액({min_amount}원)보다 낮습니다.")]
    BidTooLow { amount: i64, min_amount: i64 },

    /// 판매자 본인 경매 입찰 시도
    #[error("본인이 등록한 경매에는 입찰할 수 없습니다. (경매 ID: {auction_id}, 판매자 ID: {seller_id})")]
    SelfBidNotAllowed { auction_id: i64, seller_id: i64 },

    /// DIRECT 입찰에 금액 누락
    #[error("금액 직접 지정 입찰 시 입찰 금액은 필수입니다.")]
    AmountRequiredForDirectBid,

    /// 허용되지 않는 경매 진행 시간
    #[error("경매 진행 시간은 24시간 또는 48시간만 선택할 수 있습니다. (요청: {0}시간)")]
    InvalidDuration(i64),

    /// 거래를 찾을 수 없음
    #[error("거래를 찾을 수 없습니다. (거래 ID: {0})")]
    TransactionNotFound(i64),

    /// 거래 구매자가 아닌 사용자의 결제 시도
    #[error("해당 거래의 구매자가 아닙니다. (거래 ID: {transaction_id}, 사용자 ID: {user_id})")]
    NotTransactionBuyer { transaction_id: i64, user_id: i64 },

    /// 이미 결제 완료되었거나 취소된 거래
    #[error("이미 처리된 거래입니다. (거래 ID: {0})")]
    AlreadyPaid(i64),

    /// 결제 기한 만료
    #[error("결제 기한이 만료된 거래입니다. (거래 ID: {0})")]
    PaymentExpired(i64),

    /// 낙찰 정보를 찾을 수 없음
    #[error("낙찰 정보를 찾을 수 없습니다. (낙찰 ID: {0})")]
    WinningNotFound(i64),

    /// PG사 결제 실패
    #[error("결제 처리에 실패했습니다. (거래 ID: {0})")]
    PaymentGatewayFailed(i64),

    /// 저장소 오류 (호출자가 재시도 가능)
    #[error("저장소 오류: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// 클라이언트 응답용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::AuctionNotFound(_) => "AUCTION_NOT_FOUND",
            EngineError::AuctionNotActive(_) => "AUCTION_ENDED",
            EngineError::BidTooLow { .. } => "BID_TOO_LOW",
            EngineError::SelfBidNotAllowed { .. } => "SELF_BID_NOT_ALLOWED",
            EngineError::AmountRequiredForDirectBid => "AMOUNT_REQUIRED",
            EngineError::InvalidDuration(_) => "INVALID_DURATION",
            EngineError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            EngineError::NotTransactionBuyer { .. } => "NOT_TRANSACTION_BUYER",
            EngineError::AlreadyPaid(_) => "ALREADY_PAID",
            EngineError::PaymentExpired(_) => "PAYMENT_EXPIRED",
            EngineError::WinningNotFound(_) => "WINNING_NOT_FOUND",
            EngineError::PaymentGatewayFailed(_) => "PAYMENT_GATEWAY_FAILED",
            EngineError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::AuctionNotFound(_)
            | EngineError::TransactionNotFound(_)
            | EngineError::WinningNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::SelfBidNotAllowed { .. } | EngineError::NotTransactionBuyer { .. } => {
                StatusCode::FORBIDDEN
            }
            EngineError::Database(_) | EngineError::PaymentGatewayFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
// endregion: --- Engine Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 오류 코드 매핑 확인
    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::BidTooLow {
                amount: 1_000,
                min_amount: 1_500
            }
            .code(),
            "BID_TOO_LOW"
        );
        assert_eq!(EngineError::AuctionNotFound(1).code(), "AUCTION_NOT_FOUND");
        assert_eq!(EngineError::AmountRequiredForDirectBid.code(), "AMOUNT_REQUIRED");
        assert_eq!(EngineError::InvalidDuration(72).code(), "INVALID_DURATION");
    }
}
// endregion: --- Tests
