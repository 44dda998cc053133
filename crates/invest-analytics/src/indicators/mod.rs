//! 기술적 지표 모듈.
//!
//! 일봉 배열 위에서 동작하는 무상태 지표 함수들을 제공합니다.
//! 백테스트 엔진의 진입/청산 신호 생성에 사용됩니다.
//!
//! # 지원 지표
//!
//! - **SMA**: 단순 이동평균 (Simple Moving Average)
//! - **EMA**: 지수 이동평균 (Exponential Moving Average)
//! - **표준편차**: 모집단 표준편차 (윈도우 기준)
//! - **크로스 감지**: 임계값 돌파, 골든/데드 크로스

pub mod trend;

use thiserror::Error;

pub use trend::{
    crossed_above, crossed_below, dead_cross, golden_cross, TrendIndicators,
};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 요청한 시점까지의 이력이 부족함 - 호출자가 데이터를 더 모으거나
    /// 기간을 줄이면 복구 가능
    #[error("이력이 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientHistory { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;
