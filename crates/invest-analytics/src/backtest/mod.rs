//! 백테스팅 모듈.
//!
//! 일봉 배열 위에서 이동평균 크로스 전략을 바 단위로 재생하고,
//! 생성된 거래를 FIFO 매칭 엔진에 통과시켜 성과 지표를 집계합니다.

pub mod engine;

use thiserror::Error;

pub use engine::{BacktestConfig, BacktestEngine, BacktestReport, ExecutionPolicy};

use crate::fifo::MatchError;
use crate::indicators::IndicatorError;
use crate::performance::MetricsError;

/// 백테스트 오류.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 설정 오류 (기간/자본금/수수료율 제약 위반)
    #[error("백테스트 설정 오류: {0}")]
    InvalidConfig(String),

    /// 입력 데이터 오류 (일봉 정렬/중복 날짜)
    #[error("잘못된 입력: {0}")]
    MalformedInput(String),

    /// 웜업 기간 대비 일봉 수 부족 - 루프 시작 전에 검출
    #[error("일봉이 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientHistory { required: usize, provided: usize },

    /// 지표 계산 오류
    #[error("지표 계산 실패: {0}")]
    Indicator(#[from] IndicatorError),

    /// FIFO 매칭 오류
    #[error("FIFO 매칭 실패: {0}")]
    Match(#[from] MatchError),

    /// 성과 지표 집계 오류
    #[error("성과 지표 집계 실패: {0}")]
    Metrics(#[from] MetricsError),
}
