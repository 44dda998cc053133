//! 청산 거래(ClosedTrade) 기록 타입.
//!
//! 매도 한 건당 하나의 청산 거래가 생성됩니다. 매도가 여러 랏에 걸치면
//! 원가와 수수료는 소비된 랏 전체의 합이 됩니다. REST/분석 계층이
//! 직렬화·캐시하는 DTO 형태의 결과 레코드입니다.

use crate::domain::calculations::return_pct;
use crate::domain::transaction::Transaction;
use crate::types::{Money, Percentage, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 청산 거래 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// 청산을 일으킨 매도 거래 ID
    pub sell_transaction_id: i64,
    /// 종목 코드
    pub symbol: String,
    /// 계좌 ID
    pub account_id: i64,
    /// 청산 수량
    pub quantity_closed: Quantity,
    /// 매도 대금 (매도 단가 × 청산 수량)
    pub sell_proceeds: Money,
    /// 소비된 원가 (걸친 랏 전체의 합)
    pub cost_basis_consumed: Money,
    /// 총 수수료 (매도 수수료 + 안분된 매수 수수료)
    pub commission_total: Money,
    /// 실현 손익 (대금 − 원가 − 수수료)
    pub realized_pnl: Money,
    /// 수량 가중 평균 보유 기간 (일)
    pub holding_period_days: Decimal,
    /// R배수 (손절 정보가 없거나 주당 위험이 0이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_multiple: Option<Decimal>,
    /// 청산 시각 (매도 체결 시각)
    pub closed_at: DateTime<Utc>,
    /// 전략 강제 청산 여부 (백테스트 종료 시점 청산 구분용)
    #[serde(default)]
    pub forced_close: bool,
}

impl ClosedTrade {
    /// 수익 거래인지 확인합니다.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }

    /// 원가 대비 수익률(백분율)을 반환합니다.
    pub fn return_pct(&self) -> Percentage {
        return_pct(self.realized_pnl, self.cost_basis_consumed)
    }

    /// 파생 필드를 매도 거래 기록에 스탬프합니다.
    ///
    /// 영속 계층이 이 거래를 저장하는 것으로 쓰기 작업이 완료됩니다.
    /// 매도 거래가 아니면 아무 일도 하지 않습니다.
    pub fn stamp(&self, tx: &mut Transaction) {
        if !tx.is_sell() || tx.id != self.sell_transaction_id {
            return;
        }

        tx.realized_pnl = Some(self.realized_pnl);
        tx.cost_basis_consumed = Some(self.cost_basis_consumed);
        tx.r_multiple = self.r_multiple;
        tx.holding_period_days = Some(self.holding_period_days);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_trade() -> ClosedTrade {
        ClosedTrade {
            sell_transaction_id: 3,
            symbol: "005930".to_string(),
            account_id: 1,
            quantity_closed: dec!(15),
            sell_proceeds: dec!(1800),
            cost_basis_consumed: dec!(1550),
            commission_total: dec!(0),
            realized_pnl: dec!(250),
            holding_period_days: dec!(1.5),
            r_multiple: Some(dec!(2)),
            closed_at: Utc::now(),
            forced_close: false,
        }
    }

    #[test]
    fn test_winner_and_return() {
        let trade = sample_trade();
        assert!(trade.is_winner());
        // 250 / 1550 × 100 ≈ 16.13%
        assert!((trade.return_pct() - dec!(16.129032258064516129032258065)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_stamp_writes_derived_fields() {
        let trade = sample_trade();
        let mut tx = Transaction::sell(3, 1, "005930", dec!(15), dec!(120), trade.closed_at);

        trade.stamp(&mut tx);

        assert_eq!(tx.realized_pnl, Some(dec!(250)));
        assert_eq!(tx.cost_basis_consumed, Some(dec!(1550)));
        assert_eq!(tx.r_multiple, Some(dec!(2)));
        assert_eq!(tx.holding_period_days, Some(dec!(1.5)));
    }

    #[test]
    fn test_stamp_ignores_other_transactions() {
        let trade = sample_trade();
        // 다른 ID의 매도 거래
        let mut other = Transaction::sell(99, 1, "005930", dec!(15), dec!(120), trade.closed_at);
        trade.stamp(&mut other);
        assert!(other.realized_pnl.is_none());

        // 매수 거래
        let mut buy = Transaction::buy(3, 1, "005930", dec!(15), dec!(120), trade.closed_at);
        trade.stamp(&mut buy);
        assert!(buy.realized_pnl.is_none());
    }
}
