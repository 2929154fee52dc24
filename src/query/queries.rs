/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT id, seller_id, title, description, category, start_price, current_price,
           instant_buy_price, bid_increment, scheduled_end_time, actual_end_time,
           extension_count, total_bid_count, status, winner_id, created_at, updated_at
    FROM auctions
    WHERE id = $1
"#;

/// 경매 등록
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (seller_id, title, description, category, start_price,
                          current_price, instant_buy_price, bid_increment,
                          scheduled_end_time, status)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING id
"#;

/// 진행 중인 경매 목록 조회
pub const GET_ACTIVE_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, description, category, start_price, current_price,
           instant_buy_price, bid_increment, scheduled_end_time, actual_end_time,
           extension_count, total_bid_count, status, winner_id, created_at, updated_at
    FROM auctions
    WHERE status = 'ACTIVE'
    ORDER BY scheduled_end_time ASC
"#;

/// 마감 시각이 지난 진행 중인 경매 조회
pub const GET_EXPIRED_ACTIVE_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, description, category, start_price, current_price,
           instant_buy_price, bid_increment, scheduled_end_time, actual_end_time,
           extension_count, total_bid_count, status, winner_id, created_at, updated_at
    FROM auctions
    WHERE status = 'ACTIVE' AND scheduled_end_time <= $1
    ORDER BY scheduled_end_time ASC
"#;

/// 입찰 반영 - 진행 중인 경매에만 적용된다
pub const UPDATE_AUCTION_ON_BID: &str = r#"
    UPDATE auctions
    SET current_price = $2, bid_increment = $3, scheduled_end_time = $4,
        extension_count = $5, total_bid_count = $6, updated_at = now()
    WHERE id = $1 AND status = 'ACTIVE'
"#;

/// 마감 선점 - 진행 중이고, 연장이 모두 반영된 종료 시각이 지났을 때만 닫는다.
/// 막 커밋된 연장은 종료 시각 조건에 걸려 선점을 무산시킨다
pub const CLAIM_AUCTION_CLOSE: &str = r#"
    UPDATE auctions
    SET status = 'CLOSED', actual_end_time = $2, updated_at = now()
    WHERE id = $1 AND status = 'ACTIVE' AND scheduled_end_time <= $3
    RETURNING id
"#;

/// 낙찰자 변경 (2순위 승계)
pub const UPDATE_AUCTION_WINNER: &str = r#"
    UPDATE auctions
    SET winner_id = $2, updated_at = now()
    WHERE id = $1
"#;

/// 유찰 처리 (결제 실패로 인한 사후 유찰)
pub const MARK_AUCTION_FAILED: &str = r#"
    UPDATE auctions
    SET status = 'FAILED', winner_id = NULL, updated_at = now()
    WHERE id = $1
"#;

/// 입찰 기록 저장 - 중복 전달은 토큰 충돌로 무시된다
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, bid_type, idempotency_token)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (idempotency_token) DO NOTHING
    RETURNING id
"#;

/// 입찰 이력 조회
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bid_type, idempotency_token, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at DESC
"#;

/// 상위 2명의 입찰자 조회 - 입찰자별 최고가 중 상위 2건, 동액은 선착순
pub const GET_TOP_TWO_BIDDERS: &str = r#"
    SELECT bidder_id, amount
    FROM (
        SELECT DISTINCT ON (bidder_id) bidder_id, amount, created_at
        FROM bids
        WHERE auction_id = $1
        ORDER BY bidder_id, amount DESC, created_at ASC
    ) best
    ORDER BY amount DESC, created_at ASC
    LIMIT 2
"#;

/// 낙찰 기록 저장
pub const INSERT_WINNING: &str = r#"
    INSERT INTO winnings (auction_id, rank, bidder_id, bid_amount, status, response_deadline)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id
"#;

/// 경매의 낙찰 기록 조회
pub const GET_WINNINGS_BY_AUCTION: &str = r#"
    SELECT id, auction_id, rank, bidder_id, bid_amount, status, response_deadline, created_at
    FROM winnings
    WHERE auction_id = $1
    ORDER BY rank ASC
"#;

/// 낙찰 조회
pub const GET_WINNING: &str = r#"
    SELECT id, auction_id, rank, bidder_id, bid_amount, status, response_deadline, created_at
    FROM winnings
    WHERE id = $1
"#;

/// 경매의 특정 순위 낙찰 조회
pub const GET_WINNING_BY_RANK: &str = r#"
    SELECT id, auction_id, rank, bidder_id, bid_amount, status, response_deadline, created_at
    FROM winnings
    WHERE auction_id = $1 AND rank = $2
"#;

/// 응답 기한이 지난 결제 대기 낙찰 조회 - 기한 미부여(2순위 대기) 행은 제외된다
pub const GET_EXPIRED_PENDING_WINNINGS: &str = r#"
    SELECT id, auction_id, rank, bidder_id, bid_amount, status, response_deadline, created_at
    FROM winnings
    WHERE status = 'PENDING_PAYMENT'
      AND response_deadline IS NOT NULL
      AND response_deadline <= $1
"#;

/// 노쇼 선점 - 아직 결제 대기인 경우에만 전이시킨다
pub const CLAIM_WINNING_NO_SHOW: &str = r#"
    UPDATE winnings
    SET status = 'NO_SHOW'
    WHERE id = $1 AND status = 'PENDING_PAYMENT'
    RETURNING id
"#;

/// 2순위 승계 - 결제 기한을 부여한다
pub const PROMOTE_SECOND_RANK: &str = r#"
    UPDATE winnings
    SET response_deadline = $2
    WHERE id = $1 AND status = 'PENDING_PAYMENT'
"#;

/// 낙찰 유찰 처리
pub const MARK_WINNING_FAILED: &str = r#"
    UPDATE winnings
    SET status = 'FAILED'
    WHERE id = $1 AND status = 'PENDING_PAYMENT'
"#;

/// 결제 완료 시 대기 중인 2순위 해제 - 결제자 본인의 낙찰은 건드리지 않는다
pub const RELEASE_STANDBY_WINNING: &str = r#"
    UPDATE winnings
    SET status = 'FAILED'
    WHERE auction_id = $1 AND rank = 2 AND status = 'PENDING_PAYMENT' AND bidder_id <> $2
"#;

/// 결제 완료 전이 - 해당 입찰자의 결제 대기 낙찰만 전이된다
pub const MARK_WINNING_PAID: &str = r#"
    UPDATE winnings
    SET status = 'PAID'
    WHERE auction_id = $1 AND bidder_id = $2 AND status = 'PENDING_PAYMENT'
"#;

/// 거래 생성
pub const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (auction_id, seller_id, buyer_id, final_price, status, payment_deadline)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id
"#;

/// 거래 조회
pub const GET_TRANSACTION: &str = r#"
    SELECT id, auction_id, seller_id, buyer_id, final_price, status,
           payment_deadline, paid_at, reminder_sent, created_at
    FROM transactions
    WHERE id = $1
"#;

/// 경매의 결제 대기 거래 조회
pub const GET_AWAITING_TRANSACTION_BY_AUCTION: &str = r#"
    SELECT id, auction_id, seller_id, buyer_id, final_price, status,
           payment_deadline, paid_at, reminder_sent, created_at
    FROM transactions
    WHERE auction_id = $1 AND status = 'AWAITING_PAYMENT'
"#;

/// 결제 선점 - 결제 대기 상태인 경우에만 완료로 전이시킨다
pub const CLAIM_TRANSACTION_PAID: &str = r#"
    UPDATE transactions
    SET status = 'PAID', paid_at = $2
    WHERE id = $1 AND status = 'AWAITING_PAYMENT'
    RETURNING id
"#;

/// 거래 취소 (노쇼, 유찰)
pub const CANCEL_TRANSACTION: &str = r#"
    UPDATE transactions
    SET status = 'CANCELLED'
    WHERE auction_id = $1 AND status = 'AWAITING_PAYMENT'
"#;

/// 거래 승계 - 구매자를 2순위로 교체하고 기한과 안내 플래그를 초기화한다
pub const TRANSFER_TRANSACTION: &str = r#"
    UPDATE transactions
    SET buyer_id = $2, final_price = $3, payment_deadline = $4, reminder_sent = FALSE
    WHERE auction_id = $1 AND status = 'AWAITING_PAYMENT'
"#;

/// 결제 기한 임박 안내 대상 조회
pub const GET_REMINDER_TARGETS: &str = r#"
    SELECT id, auction_id, seller_id, buyer_id, final_price, status,
           payment_deadline, paid_at, reminder_sent, created_at
    FROM transactions
    WHERE status = 'AWAITING_PAYMENT'
      AND reminder_sent = FALSE
      AND payment_deadline > $1
      AND payment_deadline <= $2
"#;

/// 안내 발송 완료 표시
pub const MARK_REMINDER_SENT: &str = r#"
    UPDATE transactions
    SET reminder_sent = TRUE
    WHERE id = $1
"#;

/// 경고 누적
pub const ADD_USER_WARNING: &str = r#"
    UPDATE users
    SET warning_count = warning_count + 1
    WHERE id = $1
    RETURNING warning_count
"#;
