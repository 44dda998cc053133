//! 매매 회계 및 정량 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - FIFO 랏 매칭 (실현 손익, 소비 원가, R배수 계산)
//! - 성과/리스크 지표 계산 (샤프, 소르티노, 칼마, VaR 등)
//! - 기술적 지표 (SMA, EMA, 표준편차, 크로스 감지)
//! - 백테스팅 엔진 (골든/데드 크로스 전략 시뮬레이션)
//!
//! 모든 구성 요소는 공유 가변 상태 없이 순수하게 동작합니다.
//! 입력(거래, 일봉)은 호출자가 메모리에 올려 공급하며, 내부에서
//! I/O를 수행하지 않으므로 매칭/지표/백테스트 실행은 계좌·종목 단위로
//! 자유롭게 병렬화할 수 있습니다.

pub mod backtest;
pub mod fifo;
pub mod indicators;
pub mod performance;

// FIFO 모듈 re-exports
pub use fifo::{FifoMatcher, MatchError, MatchResult};

// Indicators 모듈 re-exports
pub use indicators::{
    crossed_above, crossed_below, dead_cross, golden_cross, IndicatorError, IndicatorResult,
    TrendIndicators,
};

// Performance 모듈 re-exports
pub use performance::{
    compute_metrics, EquityPoint, MetricsError, RiskLevel, RiskMetrics, StreakStats, Var95,
    DAYS_PER_YEAR, MAX_RATIO_VALUE, MAX_SORTINO_VALUE, TRADING_DAYS_PER_YEAR,
};

// Backtest 모듈 re-exports
pub use backtest::{BacktestConfig, BacktestEngine, BacktestError, BacktestReport, ExecutionPolicy};
