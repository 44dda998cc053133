//! # Invest Core
//!
//! 투자 추적기의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 매매 회계 및 분석 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 거래(매수/매도) 기록 타입
//! - 미체결 매수 랏(Lot) 및 청산 거래 기록
//! - 일봉 가격 데이터 구조체
//! - 손익 계산 공통 로직
//! - 금액/비율 반올림 정책
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use logging::*;
pub use types::*;
