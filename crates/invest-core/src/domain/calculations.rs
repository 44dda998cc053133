//! 매매 손익 계산 공통 로직.
//!
//! FIFO 매칭과 성과 지표 계산이 공유하는 손익 함수를 제공합니다.
//! 모든 함수는 원본 정밀도로 계산하며, 반올림은 호출자가 보고 시점에
//! 적용합니다.

use crate::types::{Money, Percentage, Price, Quantity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 매도 대금 계산 (매도 단가 × 수량).
pub fn sell_proceeds(sell_unit_price: Price, quantity: Quantity) -> Money {
    sell_unit_price * quantity
}

/// 실현 손익 계산.
///
/// 실현 손익 = 매도 대금 − 소비 원가 − 총 수수료
pub fn realized_pnl(proceeds: Money, cost_basis: Money, commission: Money) -> Money {
    proceeds - cost_basis - commission
}

/// 수익률 계산 (백분율).
///
/// # 인자
///
/// * `pnl` - 실현 손익
/// * `cost_basis` - 소비 원가 (진입 시 투입 자본)
pub fn return_pct(pnl: Money, cost_basis: Money) -> Percentage {
    if cost_basis > Decimal::ZERO {
        (pnl / cost_basis) * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// R배수 계산.
///
/// R배수 = 주당 실현 손익 / 주당 위험 (|진입 단가 − 손절 가격|)
///
/// 주당 위험이 0이면 `None`을 반환합니다. 0으로 나누지 않으며,
/// 0을 기본값으로 쓰지도 않습니다 (0은 본전 R배수로 오인됨).
pub fn r_multiple(
    pnl_per_share: Decimal,
    entry_unit_cost: Price,
    stop_loss_price: Price,
) -> Option<Decimal> {
    let risk_per_share = (entry_unit_cost - stop_loss_price).abs();
    if risk_per_share > Decimal::ZERO {
        Some(pnl_per_share / risk_per_share)
    } else {
        None
    }
}

/// 수량 가중 평균 보유 기간 계산 (일).
///
/// 매도 한 건이 여러 랏에 걸칠 때, 랏별 (보유 일수, 소비 수량) 쌍을
/// 소비 수량으로 가중 평균합니다.
///
/// # 인자
///
/// * `weighted_days` - (보유 일수, 소비 수량) 쌍 목록
pub fn weighted_holding_days(weighted_days: &[(Decimal, Quantity)]) -> Decimal {
    let total_qty: Quantity = weighted_days.iter().map(|(_, q)| *q).sum();
    if total_qty.is_zero() {
        return Decimal::ZERO;
    }

    let weighted_sum: Decimal = weighted_days.iter().map(|(d, q)| *d * *q).sum();
    weighted_sum / total_qty
}
