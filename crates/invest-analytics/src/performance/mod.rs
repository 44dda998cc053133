//! 성과/리스크 지표 모듈.
//!
//! 청산 거래 목록과 자산 곡선에서 승률, 기대값, 샤프/소르티노/칼마 비율,
//! 변동성, 최대 낙폭, 프로핏 팩터, 모수적 VaR를 집계합니다.
//!
//! 통계 중간 계산은 f64로 수행하고, 보고 경계에서 단 한 번
//! Decimal로 반올림합니다.

pub mod metrics;
pub mod streaks;

use thiserror::Error;

pub use metrics::{
    compute_metrics, EquityPoint, RiskLevel, RiskMetrics, Var95, DAYS_PER_YEAR, MAX_RATIO_VALUE,
    MAX_SORTINO_VALUE, TRADING_DAYS_PER_YEAR, VAR_CONFIDENCE_Z,
};
pub use streaks::StreakStats;

/// 지표 집계 오류.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// 수익률 관측치 부족 - 자산 곡선이 더 쌓이면 복구 가능
    #[error("수익률 관측치가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },
}
