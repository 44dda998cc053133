//! FIFO 랏 매칭 엔진.
//!
//! 계좌+종목 단위의 거래 스트림을 시간순으로 재생하며,
//! 매수는 랏 큐에 쌓고 매도는 가장 오래된 랏부터 소비합니다.
//!
//! # 매칭 규칙
//!
//! - 매도 한 건은 여러 랏에 걸칠 수 있으며, 청산 거래(ClosedTrade)는
//!   매도당 하나만 생성됩니다 (원가는 걸친 랏 전체의 합).
//! - 매수 수수료는 소비 수량 / 최초 수량 비율로 안분됩니다.
//! - 보유 기간은 랏별 소비 수량으로 가중 평균합니다.
//! - 랏 큐는 매칭 호출 하나가 소유하는 값이며, 호출 간 공유되지 않습니다.
//!
//! # 멱등성
//!
//! 매칭은 거래 목록의 순수 함수입니다. 거래에 이미 스탬프된 파생 필드는
//! 무시하고 전부 재계산하므로, 같은 입력에 대해 몇 번을 실행해도
//! 동일한 결과가 나오며 이중 계산이 발생하지 않습니다.

use chrono::{DateTime, Utc};
use invest_core::{
    r_multiple, realized_pnl, sell_proceeds, weighted_holding_days, ClosedTrade, Lot, Money, Price,
    Quantity, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::MatchError;

/// 하루의 초 수 (보유 기간을 일 단위 소수로 환산할 때 사용).
const SECONDS_PER_DAY: i64 = 86_400;

/// 매칭 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// 청산 거래 목록 (매도 거래당 하나, 입력 순서 유지)
    pub closed_trades: Vec<ClosedTrade>,
    /// 매칭 종료 시점의 미체결 랏 (오래된 것부터)
    pub open_lots: Vec<Lot>,
}

impl MatchResult {
    /// 미체결 랏의 총 잔여 수량을 반환합니다.
    pub fn open_quantity(&self) -> Quantity {
        self.open_lots.iter().map(|l| l.remaining_quantity).sum()
    }

    /// 미체결 랏의 총 평가 원가를 반환합니다.
    pub fn open_cost_basis(&self) -> Money {
        self.open_lots.iter().map(|l| l.remaining_cost_basis()).sum()
    }

    /// 파생 필드를 매도 거래 기록들에 스탬프합니다.
    ///
    /// 영속 계층이 스탬프된 거래를 일괄 저장하는 것으로 쓰기가 완료됩니다.
    pub fn stamp_transactions(&self, transactions: &mut [Transaction]) {
        for trade in &self.closed_trades {
            if let Some(tx) = transactions
                .iter_mut()
                .find(|t| t.id == trade.sell_transaction_id)
            {
                trade.stamp(tx);
            }
        }
    }
}

/// 소비된 랏 조각 (R배수의 지배 랏 판정용).
struct ConsumedSlice {
    consumed: Quantity,
    unit_cost: Price,
    stop_loss_price: Option<Price>,
}

/// FIFO 랏 매칭 엔진.
#[derive(Debug, Default)]
pub struct FifoMatcher;

impl FifoMatcher {
    /// 새로운 매칭 엔진 생성.
    pub fn new() -> Self {
        Self
    }

    /// 계좌+종목 단위 거래 스트림을 FIFO로 매칭합니다.
    ///
    /// # 인자
    /// * `account_id` - 계좌 ID (모든 거래가 일치해야 함)
    /// * `symbol` - 종목 코드 (모든 거래가 일치해야 함)
    /// * `transactions` - 체결 시각 오름차순 정렬된 거래 목록
    ///   (동률은 거래 ID 오름차순)
    ///
    /// # 오류
    /// * [`MatchError::MalformedInput`] - 정렬/그룹핑/필드 제약 위반
    /// * [`MatchError::InsufficientLots`] - 매도 수량이 미체결 랏 합계 초과
    pub fn match_transactions(
        &self,
        account_id: i64,
        symbol: &str,
        transactions: &[Transaction],
    ) -> Result<MatchResult, MatchError> {
        self.validate_stream(account_id, symbol, transactions)?;

        let mut lots: VecDeque<Lot> = VecDeque::new();
        let mut closed_trades = Vec::new();

        for tx in transactions {
            if tx.is_buy() {
                self.open_lot(&mut lots, tx);
            } else {
                let trade = self.close_against_lots(&mut lots, tx)?;
                closed_trades.push(trade);
            }
        }

        Ok(MatchResult {
            closed_trades,
            open_lots: lots.into_iter().collect(),
        })
    }

    /// 입력 스트림의 전제 조건을 검증합니다.
    fn validate_stream(
        &self,
        account_id: i64,
        symbol: &str,
        transactions: &[Transaction],
    ) -> Result<(), MatchError> {
        for tx in transactions {
            if tx.account_id != account_id || tx.symbol != symbol {
                return Err(MatchError::MalformedInput(format!(
                    "거래 {}가 다른 계좌/종목에 속함: 계좌={} 종목={}",
                    tx.id, tx.account_id, tx.symbol
                )));
            }
            if !tx.is_well_formed() {
                return Err(MatchError::MalformedInput(format!(
                    "거래 {}의 필드 제약 위반 (수량>0, 단가>=0, 수수료>=0)",
                    tx.id
                )));
            }
        }

        for window in transactions.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);
            let out_of_order = prev.executed_at > curr.executed_at
                || (prev.executed_at == curr.executed_at && prev.id >= curr.id);
            if out_of_order {
                return Err(MatchError::MalformedInput(format!(
                    "거래가 시간순으로 정렬되어 있지 않음: {} 다음에 {}",
                    prev.id, curr.id
                )));
            }
        }

        Ok(())
    }

    /// 매수 거래로 새 랏을 엽니다.
    fn open_lot(&self, lots: &mut VecDeque<Lot>, tx: &Transaction) {
        tracing::debug!(
            transaction_id = tx.id,
            symbol = %tx.symbol,
            quantity = %tx.quantity,
            unit_price = %tx.unit_price,
            "랏 생성"
        );

        lots.push_back(Lot::open(
            tx.symbol.clone(),
            tx.account_id,
            tx.id,
            tx.executed_at,
            tx.quantity,
            tx.unit_price,
            tx.commission,
            tx.stop_loss_price,
        ));
    }

    /// 매도 거래를 랏 큐에 대고 청산합니다.
    fn close_against_lots(
        &self,
        lots: &mut VecDeque<Lot>,
        sell: &Transaction,
    ) -> Result<ClosedTrade, MatchError> {
        let mut remaining = sell.quantity;
        let mut cost_basis = Decimal::ZERO;
        let mut buy_commission = Decimal::ZERO;
        let mut holding_weights: Vec<(Decimal, Quantity)> = Vec::new();
        let mut consumed_slices: Vec<ConsumedSlice> = Vec::new();

        while remaining > Decimal::ZERO {
            let Some(lot) = lots.front_mut() else {
                tracing::warn!(
                    transaction_id = sell.id,
                    symbol = %sell.symbol,
                    short_by = %remaining,
                    "매도 수량이 미체결 랏 합계를 초과함"
                );
                return Err(MatchError::InsufficientLots {
                    symbol: sell.symbol.clone(),
                    account_id: sell.account_id,
                    short_by: remaining,
                });
            };

            let consumption = lot.consume(remaining);
            remaining -= consumption.consumed;
            cost_basis += consumption.cost_basis;
            buy_commission += consumption.commission_share;

            holding_weights.push((
                holding_days(lot.opened_at, sell.executed_at),
                consumption.consumed,
            ));
            consumed_slices.push(ConsumedSlice {
                consumed: consumption.consumed,
                unit_cost: lot.unit_cost,
                stop_loss_price: lot.stop_loss_price,
            });

            tracing::debug!(
                transaction_id = sell.id,
                buy_transaction_id = lot.buy_transaction_id,
                consumed = %consumption.consumed,
                remaining_in_lot = %lot.remaining_quantity,
                "랏 소비"
            );

            if lot.is_exhausted() {
                lots.pop_front();
            }
        }

        let proceeds = sell_proceeds(sell.unit_price, sell.quantity);
        let commission_total = sell.commission + buy_commission;
        let pnl = realized_pnl(proceeds, cost_basis, commission_total);

        Ok(ClosedTrade {
            sell_transaction_id: sell.id,
            symbol: sell.symbol.clone(),
            account_id: sell.account_id,
            quantity_closed: sell.quantity,
            sell_proceeds: proceeds,
            cost_basis_consumed: cost_basis,
            commission_total,
            realized_pnl: pnl,
            holding_period_days: weighted_holding_days(&holding_weights),
            r_multiple: self.compute_r_multiple(sell, pnl, &consumed_slices),
            closed_at: sell.executed_at,
            forced_close: false,
        })
    }

    /// R배수를 계산합니다.
    ///
    /// 손절 가격은 매도 거래의 손절을 우선 사용하고, 없으면
    /// 가장 많이 소비된(지배) 랏의 진입 손절을 사용합니다.
    /// 주당 위험이 0이면 `None` (0은 본전 R배수로 오인되므로 기본값 금지).
    fn compute_r_multiple(
        &self,
        sell: &Transaction,
        pnl: Money,
        slices: &[ConsumedSlice],
    ) -> Option<Decimal> {
        let dominant = slices.iter().max_by_key(|s| s.consumed)?;
        let stop = sell.stop_loss_price.or(dominant.stop_loss_price)?;

        let pnl_per_share = pnl / sell.quantity;
        r_multiple(pnl_per_share, dominant.unit_cost, stop)
    }
}

/// 랏 개시부터 매도까지의 보유 기간을 일 단위 소수로 반환합니다.
fn holding_days(opened_at: DateTime<Utc>, sold_at: DateTime<Utc>) -> Decimal {
    let seconds = (sold_at - opened_at).num_seconds();
    Decimal::from(seconds) / Decimal::from(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn buy(id: i64, qty: Decimal, price: Decimal, at: DateTime<Utc>) -> Transaction {
        Transaction::buy(id, 1, "005930", qty, price, at)
    }

    fn sell(id: i64, qty: Decimal, price: Decimal, at: DateTime<Utc>) -> Transaction {
        Transaction::sell(id, 1, "005930", qty, price, at)
    }

    #[test]
    fn test_fifo_spans_two_lots() {
        // 1일차 10@100 매수, 2일차 10@110 매수, 3일차 15@120 매도
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            buy(2, dec!(10), dec!(110), day(1)),
            sell(3, dec!(15), dec!(120), day(2)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        assert_eq!(result.closed_trades.len(), 1);
        let trade = &result.closed_trades[0];
        // 원가: 10×100 + 5×110 = 1550
        assert_eq!(trade.cost_basis_consumed, dec!(1550));
        // 손익: 15×120 − 1550 = 250
        assert_eq!(trade.realized_pnl, dec!(250));
        assert_eq!(trade.quantity_closed, dec!(15));

        // 잔여 랏: 5@110
        assert_eq!(result.open_lots.len(), 1);
        assert_eq!(result.open_lots[0].remaining_quantity, dec!(5));
        assert_eq!(result.open_lots[0].unit_cost, dec!(110));
    }

    #[test]
    fn test_oversell_is_error_not_clamp() {
        let txs = vec![sell(1, dec!(5), dec!(100), day(0))];
        let err = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap_err();

        match err {
            MatchError::InsufficientLots { short_by, .. } => assert_eq!(short_by, dec!(5)),
            other => panic!("예상 밖 오류: {other}"),
        }
    }

    #[test]
    fn test_oversell_mid_queue() {
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            sell(2, dec!(12), dec!(100), day(1)),
        ];
        let err = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap_err();

        match err {
            MatchError::InsufficientLots { short_by, .. } => assert_eq!(short_by, dec!(2)),
            other => panic!("예상 밖 오류: {other}"),
        }
    }

    #[test]
    fn test_unsorted_input_fails_fast() {
        let txs = vec![
            buy(2, dec!(10), dec!(100), day(1)),
            buy(1, dec!(10), dec!(100), day(0)),
        ];
        assert!(matches!(
            FifoMatcher::new().match_transactions(1, "005930", &txs),
            Err(MatchError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_equal_timestamp_requires_increasing_id() {
        let txs = vec![
            buy(2, dec!(10), dec!(100), day(0)),
            buy(1, dec!(10), dec!(100), day(0)),
        ];
        assert!(matches!(
            FifoMatcher::new().match_transactions(1, "005930", &txs),
            Err(MatchError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_mixed_symbol_fails_fast() {
        let mut other = buy(2, dec!(10), dec!(100), day(1));
        other.symbol = "000660".to_string();
        let txs = vec![buy(1, dec!(10), dec!(100), day(0)), other];

        assert!(matches!(
            FifoMatcher::new().match_transactions(1, "005930", &txs),
            Err(MatchError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_idempotent_rerun() {
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            sell(2, dec!(4), dec!(110), day(1)),
            buy(3, dec!(5), dec!(105), day(2)),
            sell(4, dec!(8), dec!(120), day(3)),
        ];

        let matcher = FifoMatcher::new();
        let first = matcher.match_transactions(1, "005930", &txs).unwrap();
        let second = matcher.match_transactions(1, "005930", &txs).unwrap();

        assert_eq!(first.closed_trades, second.closed_trades);
        assert_eq!(first.open_lots, second.open_lots);
    }

    #[test]
    fn test_stamped_fields_are_ignored_on_rerun() {
        let mut txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            sell(2, dec!(10), dec!(110), day(1)),
        ];

        let matcher = FifoMatcher::new();
        let first = matcher.match_transactions(1, "005930", &txs).unwrap();
        first.stamp_transactions(&mut txs);
        assert_eq!(txs[1].realized_pnl, Some(dec!(100)));

        // 스탬프된 상태로 재실행해도 결과는 동일
        let second = matcher.match_transactions(1, "005930", &txs).unwrap();
        assert_eq!(first.closed_trades, second.closed_trades);
    }

    #[test]
    fn test_commission_proration_across_sells() {
        // 매수 수수료 100이 두 매도에 걸쳐 안분되어야 함
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)).with_commission(dec!(100)),
            sell(2, dec!(4), dec!(110), day(1)),
            sell(3, dec!(6), dec!(110), day(2)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        assert_eq!(result.closed_trades[0].commission_total, dec!(40));
        assert_eq!(result.closed_trades[1].commission_total, dec!(60));
    }

    #[test]
    fn test_weighted_holding_period() {
        // 0일차 10주, 2일차 5주 매수 → 4일차 15주 매도
        // 보유 기간: (4×10 + 2×5) / 15 = 50/15 ≈ 3.33일
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            buy(2, dec!(5), dec!(100), day(2)),
            sell(3, dec!(15), dec!(100), day(4)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        let days = result.closed_trades[0].holding_period_days;
        assert!((days - dec!(50) / dec!(15)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_r_multiple_from_lot_stop() {
        // 진입 100, 손절 95 → 주당 위험 5. 110 매도 → 주당 손익 10 → 2R
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)).with_stop_loss(dec!(95)),
            sell(2, dec!(10), dec!(110), day(1)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        assert_eq!(result.closed_trades[0].r_multiple, Some(dec!(2)));
    }

    #[test]
    fn test_r_multiple_none_without_stop() {
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            sell(2, dec!(10), dec!(110), day(1)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        assert_eq!(result.closed_trades[0].r_multiple, None);
    }

    #[test]
    fn test_r_multiple_none_when_risk_is_zero() {
        // 손절 = 진입가 → 주당 위험 0 → R배수 None (0 아님)
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)).with_stop_loss(dec!(100)),
            sell(2, dec!(10), dec!(110), day(1)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        assert_eq!(result.closed_trades[0].r_multiple, None);
    }

    #[test]
    fn test_open_quantity_conservation() {
        let txs = vec![
            buy(1, dec!(10), dec!(100), day(0)),
            buy(2, dec!(10), dec!(110), day(1)),
            sell(3, dec!(15), dec!(120), day(2)),
        ];

        let result = FifoMatcher::new()
            .match_transactions(1, "005930", &txs)
            .unwrap();

        // Σ잔여 = Σ매수 − Σ청산
        assert_eq!(result.open_quantity(), dec!(20) - dec!(15));
        assert_eq!(result.open_cost_basis(), dec!(5) * dec!(110));
    }
}
