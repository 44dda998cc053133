//! 거래(매수/매도) 기록 타입.
//!
//! 이 모듈은 영속 계층이 공급하는 거래 기록을 정의합니다.
//! 매칭 엔진은 거래를 읽기 전용 입력으로 취급하며,
//! 매도 거래에 한해 파생 필드 4개(실현 손익, 소비 원가, R배수, 보유 기간)만
//! 계산 결과로 덧붙입니다. 파생 필드의 저장은 영속 계층의 책임입니다.

use crate::types::{Money, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "buy"),
            TransactionKind::Sell => write!(f, "sell"),
        }
    }
}

/// 거래 기록.
///
/// `realized_pnl` 이하 네 필드는 FIFO 매칭이 매도 거래에 스탬프하는
/// 파생 값입니다. 매칭은 거래 목록의 순수 함수이므로 기존에 스탬프된
/// 값은 재계산 시 무시됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 거래 ID (영속 계층 발급, 타임스탬프 동률 시 순서 결정에 사용)
    pub id: i64,
    /// 계좌 ID
    pub account_id: i64,
    /// 종목 코드
    pub symbol: String,
    /// 거래 종류
    pub kind: TransactionKind,
    /// 수량 (> 0)
    pub quantity: Quantity,
    /// 단가 (>= 0)
    pub unit_price: Price,
    /// 수수료 (>= 0)
    pub commission: Money,
    /// 체결 시각
    pub executed_at: DateTime<Utc>,
    /// 손절 가격 (R배수 계산용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<Price>,
    /// 익절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_price: Option<Price>,

    /// 실현 손익 (매도 거래에만 스탬프됨)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<Money>,
    /// 소비된 원가 (매도 거래에만 스탬프됨)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_basis_consumed: Option<Money>,
    /// R배수 (손절 기준 위험 대비 손익)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_multiple: Option<Decimal>,
    /// 수량 가중 평균 보유 기간 (일)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding_period_days: Option<Decimal>,
}

impl Transaction {
    /// 매수 거래를 생성합니다.
    pub fn buy(
        id: i64,
        account_id: i64,
        symbol: impl Into<String>,
        quantity: Quantity,
        unit_price: Price,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            account_id,
            symbol,
            TransactionKind::Buy,
            quantity,
            unit_price,
            executed_at,
        )
    }

    /// 매도 거래를 생성합니다.
    pub fn sell(
        id: i64,
        account_id: i64,
        symbol: impl Into<String>,
        quantity: Quantity,
        unit_price: Price,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            id,
            account_id,
            symbol,
            TransactionKind::Sell,
            quantity,
            unit_price,
            executed_at,
        )
    }

    fn new(
        id: i64,
        account_id: i64,
        symbol: impl Into<String>,
        kind: TransactionKind,
        quantity: Quantity,
        unit_price: Price,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            symbol: symbol.into(),
            kind,
            quantity,
            unit_price,
            commission: Decimal::ZERO,
            executed_at,
            stop_loss_price: None,
            take_profit_price: None,
            realized_pnl: None,
            cost_basis_consumed: None,
            r_multiple: None,
            holding_period_days: None,
        }
    }

    /// 수수료를 설정합니다.
    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission = commission;
        self
    }

    /// 손절 가격을 설정합니다.
    pub fn with_stop_loss(mut self, price: Price) -> Self {
        self.stop_loss_price = Some(price);
        self
    }

    /// 익절 가격을 설정합니다.
    pub fn with_take_profit(mut self, price: Price) -> Self {
        self.take_profit_price = Some(price);
        self
    }

    /// 매수 거래인지 확인합니다.
    pub fn is_buy(&self) -> bool {
        self.kind == TransactionKind::Buy
    }

    /// 매도 거래인지 확인합니다.
    pub fn is_sell(&self) -> bool {
        self.kind == TransactionKind::Sell
    }

    /// 명목 거래 금액(단가 × 수량)을 반환합니다.
    pub fn notional(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// 거래 필드가 도메인 제약을 만족하는지 확인합니다.
    ///
    /// 수량은 양수, 단가와 수수료는 0 이상이어야 합니다.
    pub fn is_well_formed(&self) -> bool {
        self.quantity > Decimal::ZERO
            && self.unit_price >= Decimal::ZERO
            && self.commission >= Decimal::ZERO
    }
}
