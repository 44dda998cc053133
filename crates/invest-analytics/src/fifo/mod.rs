//! FIFO 랏 매칭 모듈.
//!
//! 매수/매도 거래 스트림을 선입선출 방식으로 짝지어
//! 실현 손익, 소비 원가, R배수를 계산합니다.

pub mod engine;

pub use engine::{FifoMatcher, MatchResult};

use invest_core::Quantity;
use thiserror::Error;

/// FIFO 매칭 오류.
#[derive(Debug, Error)]
pub enum MatchError {
    /// 입력 전제 조건 위반 (정렬/그룹핑) - 호출자 버그, 항상 호출 실패
    #[error("잘못된 입력: {0}")]
    MalformedInput(String),

    /// 데이터 정합성 위반 - 매도에 대응하는 매수 이력이 부족함.
    /// 절대 자동 보정하지 않고 그대로 보고합니다.
    #[error("미체결 랏 부족: 계좌={account_id} 종목={symbol} 부족 수량={short_by}")]
    InsufficientLots {
        symbol: String,
        account_id: i64,
        short_by: Quantity,
    },
}
