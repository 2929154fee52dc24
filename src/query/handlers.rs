// region:    --- Imports
use super::queries;
use crate::auction::model::{Auction, AuctionStatus};
use crate::bidding::model::{Bid, BidType};
use crate::database::DatabaseManager;
use crate::winning::model::{Transaction, TransactionStatus, Winning, WinningStatus};
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Row Types

/// 저장된 상태 문자열을 도메인 열거형으로 복원하다 실패하면 디코드 오류로 취급한다
fn decode_error(what: &str, raw: &str) -> SqlxError {
    SqlxError::Decode(format!("unknown {what}: {raw}").into())
}

#[derive(sqlx::FromRow)]
struct AuctionRow {
    id: i64,
    seller_id: i64,
    title: String,
    description: String,
    category: String,
    start_price: i64,
    current_price: i64,
    instant_buy_price: Option<i64>,
    bid_increment: i64,
    scheduled_end_time: DateTime<Utc>,
    actual_end_time: Option<DateTime<Utc>>,
    extension_count: i32,
    total_bid_count: i32,
    status: String,
    winner_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuctionRow {
    fn into_domain(self) -> Result<Auction, SqlxError> {
        let status = AuctionStatus::parse(&self.status)
            .ok_or_else(|| decode_error("auction status", &self.status))?;
        Ok(Auction {
            id: self.id,
            seller_id: self.seller_id,
            title: self.title,
            description: self.description,
            category: self.category,
            start_price: self.start_price,
            current_price: self.current_price,
            instant_buy_price: self.instant_buy_price,
            bid_increment: self.bid_increment,
            scheduled_end_time: self.scheduled_end_time,
            actual_end_time: self.actual_end_time,
            extension_count: self.extension_count,
            total_bid_count: self.total_bid_count,
            status,
            winner_id: self.winner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BidRow {
    id: i64,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
    bid_type: String,
    idempotency_token: String,
    created_at: DateTime<Utc>,
}

impl BidRow {
    fn into_domain(self) -> Result<Bid, SqlxError> {
        let bid_type = BidType::parse(&self.bid_type)
            .ok_or_else(|| decode_error("bid type", &self.bid_type))?;
        Ok(Bid {
            id: self.id,
            auction_id: self.auction_id,
            bidder_id: self.bidder_id,
            amount: self.amount,
            bid_type,
            idempotency_token: self.idempotency_token,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WinningRow {
    id: i64,
    auction_id: i64,
    rank: i32,
    bidder_id: i64,
    bid_amount: i64,
    status: String,
    response_deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl WinningRow {
    fn into_domain(self) -> Result<Winning, SqlxError> {
        let status = WinningStatus::parse(&self.status)
            .ok_or_else(|| decode_error("winning status", &self.status))?;
        Ok(Winning {
            id: self.id,
            auction_id: self.auction_id,
            rank: self.rank,
            bidder_id: self.bidder_id,
            bid_amount: self.bid_amount,
            status,
            response_deadline: self.response_deadline,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    auction_id: i64,
    seller_id: i64,
    buyer_id: i64,
    final_price: i64,
    status: String,
    payment_deadline: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    reminder_sent: bool,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> Result<Transaction, SqlxError> {
        let status = TransactionStatus::parse(&self.status)
            .ok_or_else(|| decode_error("transaction status", &self.status))?;
        Ok(Transaction {
            id: self.id,
            auction_id: self.auction_id,
            seller_id: self.seller_id,
            buyer_id: self.buyer_id,
            final_price: self.final_price,
            status,
            payment_deadline: self.payment_deadline,
            paid_at: self.paid_at,
            reminder_sent: self.reminder_sent,
            created_at: self.created_at,
        })
    }
}

// endregion: --- Row Types

// region:    --- Auction Queries

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    let row = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    row.map(AuctionRow::into_domain).transpose()
}

/// 진행 중인 경매 목록 조회
pub async fn get_active_auctions(
    db_manager: &DatabaseManager,
) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 진행 중 경매 목록 조회", "Query");
    let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_ACTIVE_AUCTIONS)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(AuctionRow::into_domain).collect()
}

/// 마감 시각이 지난 진행 중인 경매 조회
pub async fn get_expired_active_auctions(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<Vec<Auction>, SqlxError> {
    let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_EXPIRED_ACTIVE_AUCTIONS)
        .bind(now)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(AuctionRow::into_domain).collect()
}

/// 경매 등록, 생성된 id를 돌려준다
pub async fn insert_auction(
    db_manager: &DatabaseManager,
    auction: &Auction,
) -> Result<i64, SqlxError> {
    info!("{:<12} --> 경매 등록: {}", "Query", auction.title);
    let row = sqlx::query(queries::INSERT_AUCTION)
        .bind(auction.seller_id)
        .bind(&auction.title)
        .bind(&auction.description)
        .bind(&auction.category)
        .bind(auction.start_price)
        .bind(auction.current_price)
        .bind(auction.instant_buy_price)
        .bind(auction.bid_increment)
        .bind(auction.scheduled_end_time)
        .bind(auction.status.as_str())
        .fetch_one(db_manager.pool())
        .await?;
    Ok(row.get("id"))
}

/// 입찰 반영 - 진행 중인 경매 행에만 기록되고, 행이 갱신됐을 때만 true.
/// false 는 그 사이 경매가 마감됐다는 뜻이므로 호출자가 롤백해야 한다
pub async fn apply_bid_to_auction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    current_price: i64,
    bid_increment: i64,
    scheduled_end_time: DateTime<Utc>,
    extension_count: i32,
    total_bid_count: i32,
) -> Result<bool, SqlxError> {
    let result = sqlx::query(queries::UPDATE_AUCTION_ON_BID)
        .bind(auction_id)
        .bind(current_price)
        .bind(bid_increment)
        .bind(scheduled_end_time)
        .bind(extension_count)
        .bind(total_bid_count)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// 마감 선점 - 이 프로세스가 전이를 따냈을 때만 true.
/// 종료 시각 조건이 같이 걸리므로 연장된 경매는 선점되지 않는다
pub async fn claim_auction_close(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    actual_end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool, SqlxError> {
    let claimed = sqlx::query(queries::CLAIM_AUCTION_CLOSE)
        .bind(auction_id)
        .bind(actual_end_time)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(claimed.is_some())
}

/// 낙찰자 변경 (2순위 승계)
pub async fn update_auction_winner(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    winner_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::UPDATE_AUCTION_WINNER)
        .bind(auction_id)
        .bind(winner_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 결제 실패로 인한 사후 유찰 처리
pub async fn mark_auction_failed(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::MARK_AUCTION_FAILED)
        .bind(auction_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// endregion: --- Auction Queries

// region:    --- Bid Queries

/// 입찰 기록 저장 - 같은 토큰의 중복 전달이면 false를 돌려준다
pub async fn insert_bid_idempotent(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    bid: &Bid,
) -> Result<bool, SqlxError> {
    let inserted = sqlx::query(queries::INSERT_BID)
        .bind(bid.auction_id)
        .bind(bid.bidder_id)
        .bind(bid.amount)
        .bind(bid.bid_type.as_str())
        .bind(&bid.idempotency_token)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(inserted.is_some())
}

/// 입찰 이력 조회
pub async fn get_bid_history(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    let rows = sqlx::query_as::<_, BidRow>(queries::GET_BID_HISTORY)
        .bind(auction_id)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(BidRow::into_domain).collect()
}

/// 상위 2명의 입찰자 조회, (bidder_id, amount) 쌍을 높은 금액 순으로 돌려준다
pub async fn get_top_two_bidders(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<Vec<(i64, i64)>, SqlxError> {
    let rows = sqlx::query(queries::GET_TOP_TWO_BIDDERS)
        .bind(auction_id)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.get("bidder_id"), row.get("amount")))
        .collect())
}

// endregion: --- Bid Queries

// region:    --- Winning Queries

/// 낙찰 기록 저장, 생성된 id를 돌려준다
pub async fn insert_winning(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    winning: &Winning,
) -> Result<i64, SqlxError> {
    let row = sqlx::query(queries::INSERT_WINNING)
        .bind(winning.auction_id)
        .bind(winning.rank)
        .bind(winning.bidder_id)
        .bind(winning.bid_amount)
        .bind(winning.status.as_str())
        .bind(winning.response_deadline)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("id"))
}

/// 경매의 낙찰 기록 조회
pub async fn get_winnings_by_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Winning>, SqlxError> {
    info!("{:<12} --> 낙찰 기록 조회 id: {}", "Query", auction_id);
    let rows = sqlx::query_as::<_, WinningRow>(queries::GET_WINNINGS_BY_AUCTION)
        .bind(auction_id)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(WinningRow::into_domain).collect()
}

/// 낙찰 조회
pub async fn get_winning(
    db_manager: &DatabaseManager,
    winning_id: i64,
) -> Result<Option<Winning>, SqlxError> {
    let row = sqlx::query_as::<_, WinningRow>(queries::GET_WINNING)
        .bind(winning_id)
        .fetch_optional(db_manager.pool())
        .await?;
    row.map(WinningRow::into_domain).transpose()
}

/// 경매의 특정 순위 낙찰 조회
pub async fn get_winning_by_rank(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    rank: i32,
) -> Result<Option<Winning>, SqlxError> {
    let row = sqlx::query_as::<_, WinningRow>(queries::GET_WINNING_BY_RANK)
        .bind(auction_id)
        .bind(rank)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(WinningRow::into_domain).transpose()
}

/// 응답 기한이 지난 결제 대기 낙찰 조회
pub async fn get_expired_pending_winnings(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<Vec<Winning>, SqlxError> {
    let rows = sqlx::query_as::<_, WinningRow>(queries::GET_EXPIRED_PENDING_WINNINGS)
        .bind(now)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(WinningRow::into_domain).collect()
}

/// 노쇼 선점 - 이 프로세스가 전이를 따냈을 때만 true
pub async fn claim_winning_no_show(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    winning_id: i64,
) -> Result<bool, SqlxError> {
    let claimed = sqlx::query(queries::CLAIM_WINNING_NO_SHOW)
        .bind(winning_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(claimed.is_some())
}

/// 2순위 승계 - 결제 기한을 부여한다
pub async fn promote_second_rank(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    winning_id: i64,
    response_deadline: DateTime<Utc>,
) -> Result<(), SqlxError> {
    sqlx::query(queries::PROMOTE_SECOND_RANK)
        .bind(winning_id)
        .bind(response_deadline)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 낙찰 유찰 처리
pub async fn mark_winning_failed(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    winning_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::MARK_WINNING_FAILED)
        .bind(winning_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 결제 완료 시 대기 중인 2순위 해제
pub async fn release_standby_winning(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    buyer_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::RELEASE_STANDBY_WINNING)
        .bind(auction_id)
        .bind(buyer_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 결제 완료 전이
pub async fn mark_winning_paid(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    bidder_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::MARK_WINNING_PAID)
        .bind(auction_id)
        .bind(bidder_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// endregion: --- Winning Queries

// region:    --- Transaction Queries

/// 거래 생성, 생성된 id를 돌려준다
pub async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction: &Transaction,
) -> Result<i64, SqlxError> {
    let row = sqlx::query(queries::INSERT_TRANSACTION)
        .bind(transaction.auction_id)
        .bind(transaction.seller_id)
        .bind(transaction.buyer_id)
        .bind(transaction.final_price)
        .bind(transaction.status.as_str())
        .bind(transaction.payment_deadline)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("id"))
}

/// 거래 조회
pub async fn get_transaction(
    db_manager: &DatabaseManager,
    transaction_id: i64,
) -> Result<Option<Transaction>, SqlxError> {
    info!("{:<12} --> 거래 조회 id: {}", "Query", transaction_id);
    let row = sqlx::query_as::<_, TransactionRow>(queries::GET_TRANSACTION)
        .bind(transaction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    row.map(TransactionRow::into_domain).transpose()
}

/// 경매의 결제 대기 거래 조회
pub async fn get_awaiting_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<Option<Transaction>, SqlxError> {
    let row = sqlx::query_as::<_, TransactionRow>(queries::GET_AWAITING_TRANSACTION_BY_AUCTION)
        .bind(auction_id)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(TransactionRow::into_domain).transpose()
}

/// 결제 선점 - 이 프로세스가 전이를 따냈을 때만 true
pub async fn claim_transaction_paid(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: i64,
    paid_at: DateTime<Utc>,
) -> Result<bool, SqlxError> {
    let claimed = sqlx::query(queries::CLAIM_TRANSACTION_PAID)
        .bind(transaction_id)
        .bind(paid_at)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(claimed.is_some())
}

/// 거래 취소
pub async fn cancel_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::CANCEL_TRANSACTION)
        .bind(auction_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 거래 승계 - 구매자를 2순위로 교체한다
pub async fn transfer_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    auction_id: i64,
    buyer_id: i64,
    final_price: i64,
    payment_deadline: DateTime<Utc>,
) -> Result<(), SqlxError> {
    sqlx::query(queries::TRANSFER_TRANSACTION)
        .bind(auction_id)
        .bind(buyer_id)
        .bind(final_price)
        .bind(payment_deadline)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// 결제 기한 임박 안내 대상 조회
pub async fn get_reminder_targets(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Transaction>, SqlxError> {
    let rows = sqlx::query_as::<_, TransactionRow>(queries::GET_REMINDER_TARGETS)
        .bind(now)
        .bind(window_end)
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(TransactionRow::into_domain).collect()
}

/// 안내 발송 완료 표시
pub async fn mark_reminder_sent(
    db_manager: &DatabaseManager,
    transaction_id: i64,
) -> Result<(), SqlxError> {
    sqlx::query(queries::MARK_REMINDER_SENT)
        .bind(transaction_id)
        .execute(db_manager.pool())
        .await?;
    Ok(())
}

// endregion: --- Transaction Queries

// region:    --- User Queries

/// 경고 누적, 누적 후의 경고 횟수를 돌려준다
pub async fn add_user_warning(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
) -> Result<i32, SqlxError> {
    let row = sqlx::query(queries::ADD_USER_WARNING)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| r.get("warning_count")).unwrap_or(0))
}

// endregion: --- User Queries
