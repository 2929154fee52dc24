/// 엔진 설정
/// 연장 임계값, 결제 기한 등 모든 정책 수치는 환경 변수로 조정 가능한 값이다
// region:    --- Imports
use chrono::Duration;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Engine Config
/// 경매 엔진 정책 설정
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 종료 N초 전부터 연장 구간 (anti-snipe)
    pub anti_snipe_threshold_secs: i64,
    /// 연장 구간 입찰 시 종료 시간을 미루는 길이 (초)
    pub anti_snipe_extension_secs: i64,
    /// 1순위 낙찰자 결제 기한 (시간)
    pub payment_deadline_hours: i64,
    /// 2순위 승계 후 결제 기한 (시간)
    pub transfer_deadline_hours: i64,
    /// 2순위 자동 승계 기준 비율 (1순위 금액 대비)
    pub auto_transfer_floor: f64,
    /// 결제 마감 임박 리마인더 구간 (분)
    pub reminder_window_mins: i64,
    /// 노쇼 경고 누적 차단 기준 횟수
    pub warning_threshold: i32,
    /// 경매 종료 스윕 주기 (밀리초)
    pub closing_sweep_millis: u64,
    /// 결제 기한 만료 스윕 주기 (초)
    pub payment_sweep_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anti_snipe_threshold_secs: 300,
            anti_snipe_extension_secs: 300,
            payment_deadline_hours: 3,
            transfer_deadline_hours: 1,
            auto_transfer_floor: 0.9,
            reminder_window_mins: 60,
            warning_threshold: 3,
            closing_sweep_millis: 1000,
            payment_sweep_secs: 60,
        }
    }
}

impl EngineConfig {
    /// 환경 변수에서 설정 로드 (없는 값은 기본값 사용)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            anti_snipe_threshold_secs: env_or(
                "ANTI_SNIPE_THRESHOLD_SECS",
                defaults.anti_snipe_threshold_secs,
            ),
            anti_snipe_extension_secs: env_or(
                "ANTI_SNIPE_EXTENSION_SECS",
                defaults.anti_snipe_extension_secs,
            ),
            payment_deadline_hours: env_or("PAYMENT_DEADLINE_HOURS", defaults.payment_deadline_hours),
            transfer_deadline_hours: env_or(
                "TRANSFER_DEADLINE_HOURS",
                defaults.transfer_deadline_hours,
            ),
            auto_transfer_floor: env_or("AUTO_TRANSFER_FLOOR", defaults.auto_transfer_floor),
            reminder_window_mins: env_or("REMINDER_WINDOW_MINS", defaults.reminder_window_mins),
            warning_threshold: env_or("WARNING_THRESHOLD", defaults.warning_threshold),
            closing_sweep_millis: env_or("CLOSING_SWEEP_MILLIS", defaults.closing_sweep_millis),
            payment_sweep_secs: env_or("PAYMENT_SWEEP_SECS", defaults.payment_sweep_secs),
        }
    }

    /// 연장 임계값 (밀리초)
    pub fn anti_snipe_threshold_ms(&self) -> i64 {
        self.anti_snipe_threshold_secs * 1000
    }

    /// 연장 길이 (밀리초)
    pub fn anti_snipe_extension_ms(&self) -> i64 {
        self.anti_snipe_extension_secs * 1000
    }

    /// 1순위 결제 기한 Duration
    pub fn payment_deadline(&self) -> Duration {
        Duration::hours(self.payment_deadline_hours)
    }

    /// 2순위 승계 결제 기한 Duration
    pub fn transfer_deadline(&self) -> Duration {
        Duration::hours(self.transfer_deadline_hours)
    }

    /// 결제 마감 임박 리마인더 구간 Duration
    pub fn reminder_window(&self) -> Duration {
        Duration::minutes(self.reminder_window_mins)
    }

    /// 2순위 자동 승계 최저 금액 (1순위 금액 기준)
    pub fn auto_transfer_floor_amount(&self, first_rank_amount: i64) -> i64 {
        (first_rank_amount as f64 * self.auto_transfer_floor) as i64
    }
}

/// 환경 변수 파싱, 실패 시 기본값
fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
// endregion: --- Engine Config

// endregion: --- Tests
