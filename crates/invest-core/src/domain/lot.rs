//! 미체결 매수 랏(Lot) 타입.
//!
//! 랏은 매수 한 건이 만들어내는 미청산 보유 단위입니다.
//! 하나의 매칭 실행이 소유하는 값으로, 매칭 호출 간에 공유되지 않습니다.
//! 매도가 소비할 때마다 잔여 수량이 줄고, 0이 되면 큐 소유자가 제거합니다.

use crate::types::{Money, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 미체결 매수 랏.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// 종목 코드
    pub symbol: String,
    /// 계좌 ID
    pub account_id: i64,
    /// 랏을 연 매수 거래 ID
    pub buy_transaction_id: i64,
    /// 매수 체결 시각
    pub opened_at: DateTime<Utc>,
    /// 최초 수량
    pub original_quantity: Quantity,
    /// 잔여 수량 (>= 0)
    pub remaining_quantity: Quantity,
    /// 매수 단가
    pub unit_cost: Price,
    /// 이 랏에 배분된 매수 수수료
    pub allocated_commission: Money,
    /// 진입 시 손절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<Price>,
}

/// 랏 1회 소비 결과.
#[derive(Debug, Clone, Copy)]
pub struct LotConsumption {
    /// 소비된 수량
    pub consumed: Quantity,
    /// 소비분 원가 (소비 수량 × 매수 단가)
    pub cost_basis: Money,
    /// 소비 비율로 안분된 매수 수수료
    pub commission_share: Money,
}

impl Lot {
    /// 매수 거래로부터 랏을 생성합니다.
    pub fn open(
        symbol: impl Into<String>,
        account_id: i64,
        buy_transaction_id: i64,
        opened_at: DateTime<Utc>,
        quantity: Quantity,
        unit_cost: Price,
        allocated_commission: Money,
        stop_loss_price: Option<Price>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            account_id,
            buy_transaction_id,
            opened_at,
            original_quantity: quantity,
            remaining_quantity: quantity,
            unit_cost,
            allocated_commission,
            stop_loss_price,
        }
    }

    /// 랏에서 최대 `requested` 수량을 소비합니다.
    ///
    /// 실제 소비량은 `min(requested, remaining_quantity)`이며,
    /// 매수 수수료는 소비량 / 최초 수량 비율로 안분됩니다.
    pub fn consume(&mut self, requested: Quantity) -> LotConsumption {
        let consumed = requested.min(self.remaining_quantity);
        self.remaining_quantity -= consumed;

        let commission_share = if self.original_quantity > Decimal::ZERO {
            self.allocated_commission * consumed / self.original_quantity
        } else {
            Decimal::ZERO
        };

        LotConsumption {
            consumed,
            cost_basis: consumed * self.unit_cost,
            commission_share,
        }
    }

    /// 잔여 수량이 모두 소진되었는지 확인합니다.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// 잔여 수량 기준 평가 원가를 반환합니다.
    pub fn remaining_cost_basis(&self) -> Money {
        self.remaining_quantity * self.unit_cost
    }
}
