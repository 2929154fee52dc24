/// 입찰 단위 / 경매 연장 정책
///
/// | 현재 가격 구간        | 입찰 단위  |
/// |--------------------|----------|
/// | 1만 원 미만          | +500원   |
/// | 1만 ~ 5만 원 미만     | +1,000원 |
/// | 5만 ~ 10만 원 미만    | +3,000원 |
/// | 10만 ~ 50만 원 미만   | +5,000원 |
/// | 50만 ~ 100만 원 미만  | +10,000원|
/// | 100만 원 이상        | +30,000원|
// region:    --- Bid Increment Policy
/// 가격 구간별 입찰 단위 테이블 (상한, 입찰 단위)
const PRICE_BRACKETS: [(i64, i64); 5] = [
    (10_000, 500),
    (50_000, 1_000),
    (100_000, 3_000),
    (500_000, 5_000),
    (1_000_000, 10_000),
];

/// 100만 원 이상 구간의 입찰 단위
const TOP_BRACKET_INCREMENT: i64 = 30_000;

/// 현재 가격에 해당하는 입찰 단위 계산
/// 입찰 단위는 가격만의 순수 함수이며 항상 0보다 크다
pub fn increment_for_price(price: i64) -> i64 {
    PRICE_BRACKETS
        .iter()
        .find(|(upper_bound, _)| price < *upper_bound)
        .map(|(_, increment)| *increment)
        .unwrap_or(TOP_BRACKET_INCREMENT)
}

// endregion: --- Bid Increment Policy

// region:    --- Duration Policy
/// 허용되는 경매 진행 시간 (시간 단위)
pub const ALLOWED_DURATION_HOURS: [i64; 2] = [24, 48];

/// 경매 진행 시간이 허용 범위인지 확인
pub fn is_allowed_duration(duration_hours: i64) -> bool {
    ALLOWED_DURATION_HOURS.contains(&duration_hours)
}
// endregion: --- Duration Policy

// region:    --- Extension Policy
/// 현재 시점이 연장 구간인지 확인 (종료 임계값 이내 && 아직 종료 전)
pub fn is_in_extension_period(scheduled_end_ms: i64, now_ms: i64, threshold_ms: i64) -> bool {
    now_ms < scheduled_end_ms && scheduled_end_ms - now_ms <= threshold_ms
}
// endregion: --- Extension Policy

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 가격 구간별 입찰 단위 확인
    #[test]
    fn test_increment_brackets() {
        assert_eq!(increment_for_price(1_000), 500);
        assert_eq!(increment_for_price(9_999), 500);
        assert_eq!(increment_for_price(10_000), 1_000);
        assert_eq!(increment_for_price(49_999), 1_000);
        assert_eq!(increment_for_price(50_000), 3_000);
        assert_eq!(increment_for_price(100_000), 5_000);
        assert_eq!(increment_for_price(500_000), 10_000);
        assert_eq!(increment_for_price(1_000_000), 30_000);
        assert_eq!(increment_for_price(10_000_000), 30_000);
    }

    /// 경매 진행 시간은 24/48시간만 허용
    #[test]
    fn test_allowed_durations() {
        assert!(is_allowed_duration(24));
        assert!(is_allowed_duration(48));
        assert!(!is_allowed_duration(0));
        assert!(!is_allowed_duration(12));
        assert!(!is_allowed_duration(72));
    }

    /// 연장 구간 판정: 종료 직전만 연장 대상
    #[test]
    fn test_extension_period() {
        let end = 1_000_000;
        let threshold = 30_000;
        assert!(is_in_extension_period(end, end - 3_000, threshold));
        assert!(is_in_extension_period(end, end - 30_000, threshold));
        assert!(!is_in_extension_period(end, end - 30_001, threshold));
        // 이미 종료 시간이 지난 경우 연장 아님
        assert!(!is_in_extension_period(end, end, threshold));
        assert!(!is_in_extension_period(end, end + 1, threshold));
    }
}
// endregion: --- Tests
