/// 입찰 고속 경로 상태 캐시
///
/// 경매별 비정규화 상태(현재가, 입찰 단위, 종료 시간, 카운트)를 메모리에 들고,
/// 입찰 중재를 경매 단위로 직렬화한다. 서로 다른 경매의 입찰은 완전히 병렬로
/// 진행되고, 같은 경매의 입찰은 경매별 잠금 아래에서 한 번에 하나씩 적용된다.
/// 가격 갱신과 연장 판정은 같은 잠금 구간 안에서 함께 평가된다.
///
/// 진행 중(ACTIVE) 구간에서는 이 캐시가 "열려 있는가 / 얼마인가"의 기준이고,
/// 이력과 교차 조회의 기준은 RDB다. 재시작 후에는 RDB의 경매 행으로
/// rehydrate 한 뒤에만 입찰을 받는다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::auction::policy;
use crate::bidding::model::BidType;
use crate::error::EngineError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

// endregion: --- Imports

// region:    --- Auction State
/// 경매별 고속 경로 상태
#[derive(Debug, Clone)]
pub struct AuctionState {
    pub auction_id: i64,
    pub seller_id: i64,
    pub status: AuctionStatus,
    pub current_price: i64,
    pub bid_increment: i64,
    /// 예정 종료 시간 (epoch 밀리초) - 연장 시 앞으로만 이동
    pub scheduled_end_ms: i64,
    pub extension_count: i32,
    pub total_bid_count: i32,
    /// 이번 프로세스에서 이미 적용한 전달 토큰 - 재전송 중복 반영 방지
    pub applied_tokens: HashSet<String>,
}

impl AuctionState {
    /// 저장소의 경매 행에서 상태 복원
    pub fn rehydrate(auction: &Auction) -> Self {
        Self {
            auction_id: auction.id,
            seller_id: auction.seller_id,
            status: auction.status,
            current_price: auction.current_price,
            bid_increment: auction.bid_increment,
            scheduled_end_ms: auction.scheduled_end_time.timestamp_millis(),
            extension_count: auction.extension_count,
            total_bid_count: auction.total_bid_count,
            applied_tokens: HashSet::new(),
        }
    }
}
// endregion: --- Auction State

// region:    --- Bid Snapshot
/// 입찰 적용 직후의 권위 있는 스냅샷
/// 이후 단계(영속화, 브로드캐스트)는 상태를 다시 읽지 않고 이 값을 사용한다
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidSnapshot {
    pub current_price: i64,
    pub bid_increment: i64,
    pub next_min_bid: i64,
    pub scheduled_end_ms: i64,
    pub extended: bool,
    pub extension_count: i32,
    pub total_bid_count: i32,
}

impl BidSnapshot {
    /// 저장소의 경매 행이 말하는 현재 상태 (중복 전달 응답용)
    pub fn from_auction(auction: &Auction) -> Self {
        Self {
            current_price: auction.current_price,
            bid_increment: auction.bid_increment,
            next_min_bid: auction.current_price + auction.bid_increment,
            scheduled_end_ms: auction.scheduled_end_time.timestamp_millis(),
            extended: false,
            extension_count: auction.extension_count,
            total_bid_count: auction.total_bid_count,
        }
    }
}
// endregion: --- Bid Snapshot

// region:    --- Fast Path Cache
/// 경매별 직렬화를 제공하는 고속 경로 캐시
pub struct FastPathCache {
    entries: RwLock<HashMap<i64, Arc<Mutex<AuctionState>>>>,
    threshold_ms: i64,
    extension_ms: i64,
}

impl FastPathCache {
    pub fn new(threshold_ms: i64, extension_ms: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            threshold_ms,
            extension_ms,
        }
    }

    /// 캐시에 경매 상태가 있는지 확인
    pub async fn contains(&self, auction_id: i64) -> bool {
        self.entries.read().await.contains_key(&auction_id)
    }

    /// 저장소에서 복원한 상태를 캐시에 적재
    /// 동시 적재 경쟁에서 이미 살아 있는 상태를 덮어쓰지 않는다
    pub async fn rehydrate(&self, state: AuctionState) {
        let auction_id = state.auction_id;
        let mut entries = self.entries.write().await;
        entries
            .entry(auction_id)
            .or_insert_with(|| Arc::new(Mutex::new(state)));
        debug!("{:<12} --> 경매 상태 적재: auctionId={}", "FastPath", auction_id);
    }

    /// 현재 상태 스냅샷 조회
    pub async fn load_state(&self, auction_id: i64) -> Option<AuctionState> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(&auction_id).cloned()
        };
        match entry {
            Some(entry) => Some(entry.lock().await.clone()),
            None => None,
        }
    }

    /// 입찰 한 건을 원자적으로 적용한다
    ///
    /// 검증, 가격 갱신, 입찰 단위 재계산, 카운트 증가, 연장 판정까지
    /// 경매별 잠금 아래에서 하나의 단계로 수행된다. 근소한 시간차의
    /// 두 입찰이 모두 "연장 안 됨"을 관측하는 일은 있을 수 없다.
    pub async fn apply_bid_atomic(
        &self,
        auction_id: i64,
        bidder_id: i64,
        requested_amount: Option<i64>,
        bid_type: BidType,
        idempotency_token: &str,
        now_ms: i64,
    ) -> Result<BidSnapshot, EngineError> {
        let entry = {
            let entries = self.entries.read().await;
            entries
                .get(&auction_id)
                .cloned()
                .ok_or(EngineError::AuctionNotFound(auction_id))?
        };

        let mut state = entry.lock().await;

        // 진행 중이고 종료 시간 전이어야 한다
        if state.status != AuctionStatus::Active || now_ms >= state.scheduled_end_ms {
            return Err(EngineError::AuctionNotActive(auction_id));
        }

        // 판매자 본인 입찰 금지
        if bidder_id == state.seller_id {
            return Err(EngineError::SelfBidNotAllowed {
                auction_id,
                seller_id: state.seller_id,
            });
        }

        // 같은 토큰의 재전송이면 상태를 바꾸지 않고 현재 스냅샷을 돌려준다
        if state.applied_tokens.contains(idempotency_token) {
            return Ok(BidSnapshot {
                current_price: state.current_price,
                bid_increment: state.bid_increment,
                next_min_bid: state.current_price + state.bid_increment,
                scheduled_end_ms: state.scheduled_end_ms,
                extended: false,
                extension_count: state.extension_count,
                total_bid_count: state.total_bid_count,
            });
        }

        // 입찰 금액 확정: ONE_TOUCH는 서버 계산, DIRECT는 최소 단위 검증
        let min_amount = state.current_price + state.bid_increment;
        let amount = match bid_type {
            BidType::OneTouch => min_amount,
            BidType::Direct => {
                let amount = requested_amount.ok_or(EngineError::AmountRequiredForDirectBid)?;
                if amount < min_amount {
                    return Err(EngineError::BidTooLow {
                        amount,
                        min_amount,
                    });
                }
                amount
            }
        };

        // 가격/단위/카운트 갱신
        state.current_price = amount;
        state.bid_increment = policy::increment_for_price(amount);
        state.total_bid_count += 1;
        state.applied_tokens.insert(idempotency_token.to_string());

        // 연장 판정: 가격 갱신과 같은 원자 구간에서 수행
        let extended =
            policy::is_in_extension_period(state.scheduled_end_ms, now_ms, self.threshold_ms);
        if extended {
            state.scheduled_end_ms += self.extension_ms;
            state.extension_count += 1;
        }

        Ok(BidSnapshot {
            current_price: state.current_price,
            bid_increment: state.bid_increment,
            next_min_bid: state.current_price + state.bid_increment,
            scheduled_end_ms: state.scheduled_end_ms,
            extended,
            extension_count: state.extension_count,
            total_bid_count: state.total_bid_count,
        })
    }

    /// 종료/유찰 처리 반영 (이후 입찰은 AuctionNotActive)
    pub async fn mark_closed(&self, auction_id: i64, status: AuctionStatus) {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(&auction_id).cloned()
        };
        if let Some(entry) = entry {
            let mut state = entry.lock().await;
            state.status = status;
        }
    }

    /// 종료된 경매 상태 제거
    pub async fn remove(&self, auction_id: i64) {
        self.entries.write().await.remove(&auction_id);
    }
}
// endregion: --- Fast Path Cache

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn active_state(auction_id: i64, price: i64, end_ms: i64) -> AuctionState {
        AuctionState {
            auction_id,
            seller_id: 100,
            status: AuctionStatus::Active,
            current_price: price,
            bid_increment: policy::increment_for_price(price),
            scheduled_end_ms: end_ms,
            extension_count: 0,
            total_bid_count: 0,
            applied_tokens: HashSet::new(),
        }
    }

    /// 원터치 입찰은 현재가 + 입찰 단위로 확정된다
    #[tokio::test]
    async fn test_one_touch_bid() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 10_000_000)).await;

        let snapshot = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-1", 1_000_000)
            .await
            .unwrap();
        assert_eq!(snapshot.current_price, 1_500);
        assert_eq!(snapshot.total_bid_count, 1);
        assert!(!snapshot.extended);
    }

    /// DIRECT 입찰은 최소 단위 이상이어야 하고, 단위가 가격 구간에 맞춰 재계산된다
    #[tokio::test]
    async fn test_direct_bid_retiers_increment() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 9_500, 10_000_000)).await;

        // 최소 금액 미달
        let err = cache
            .apply_bid_atomic(1, 2, Some(9_900), BidType::Direct, "tok-low", 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BidTooLow { min_amount: 10_000, .. }));

        // 구간 상향 입찰: 입찰 단위가 1,000원으로 재계산
        let snapshot = cache
            .apply_bid_atomic(1, 2, Some(15_000), BidType::Direct, "tok-up", 1_000_000)
            .await
            .unwrap();
        assert_eq!(snapshot.current_price, 15_000);
        assert_eq!(snapshot.bid_increment, 1_000);
        assert_eq!(snapshot.next_min_bid, 16_000);
    }

    /// DIRECT 입찰에 금액이 없으면 거부
    #[tokio::test]
    async fn test_direct_bid_requires_amount() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 10_000_000)).await;

        let err = cache
            .apply_bid_atomic(1, 2, None, BidType::Direct, "tok-1", 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AmountRequiredForDirectBid));
    }

    /// 판매자 본인 입찰 거부
    #[tokio::test]
    async fn test_self_bid_rejected() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 10_000_000)).await;

        let err = cache
            .apply_bid_atomic(1, 100, None, BidType::OneTouch, "tok-1", 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SelfBidNotAllowed { .. }));
    }

    /// 종료 시간이 지난 경매는 입찰 거부
    #[tokio::test]
    async fn test_expired_auction_rejected() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 1_000_000)).await;

        let err = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-1", 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AuctionNotActive(1)));
    }

    /// 종료 3초 전 입찰은 연장 플래그와 함께 종료 시간을 미룬다
    #[tokio::test]
    async fn test_anti_snipe_extension() {
        let end_ms = 1_000_000;
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, end_ms)).await;

        let snapshot = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-snipe", end_ms - 3_000)
            .await
            .unwrap();
        assert!(snapshot.extended);
        assert_eq!(snapshot.scheduled_end_ms, end_ms + 30_000);
        assert_eq!(snapshot.extension_count, 1);
    }

    /// 종료 처리 이후의 입찰은 거부된다
    #[tokio::test]
    async fn test_bid_after_close_rejected() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 10_000_000)).await;
        cache.mark_closed(1, AuctionStatus::Closed).await;

        let err = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-1", 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AuctionNotActive(1)));
    }

    /// 같은 토큰의 재전송은 가격을 두 번 올리지 않는다
    #[tokio::test]
    async fn test_duplicate_delivery_is_noop() {
        let cache = FastPathCache::new(30_000, 30_000);
        cache.rehydrate(active_state(1, 1_000, 10_000_000)).await;

        let first = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-dup", 1_000_000)
            .await
            .unwrap();
        let second = cache
            .apply_bid_atomic(1, 2, None, BidType::OneTouch, "tok-dup", 1_001_000)
            .await
            .unwrap();

        assert_eq!(second.current_price, first.current_price);
        assert_eq!(second.total_bid_count, 1);
    }
}
// endregion: --- Tests
