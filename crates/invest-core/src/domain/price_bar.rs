//! 일봉 가격 데이터 타입.
//!
//! 이 모듈은 종목별 일봉(OHLCV) 데이터를 정의합니다.
//! 가격 데이터는 영속 계층이 날짜 오름차순으로 정렬하여 공급하며,
//! 같은 종목에 중복 날짜가 없어야 합니다.

use crate::types::{Price, Quantity};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 일봉(OHLCV) 데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Quantity,
}

impl PriceBar {
    /// 새 일봉을 생성합니다.
    pub fn new(
        date: NaiveDate,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 봉 몸통 크기(절대값)를 반환합니다.
    pub fn body_size(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// 봉 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 양봉(종가 > 시가)인지 확인합니다.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// 음봉(종가 < 시가)인지 확인합니다.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// 대표가(고가+저가+종가 평균)를 반환합니다.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}

/// 일봉 배열이 날짜 오름차순이고 중복 날짜가 없는지 확인합니다.
///
/// # 반환
/// 정렬 위반 또는 중복이 처음 발견된 인덱스. 문제가 없으면 `None`.
pub fn find_ordering_violation(bars: &[PriceBar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[0].date >= w[1].date)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(date: &str, close: Decimal) -> PriceBar {
        PriceBar::new(
            date.parse().unwrap(),
            close - dec!(1),
            close + dec!(2),
            close - dec!(2),
            close,
            dec!(1000),
        )
    }

    #[test]
    fn test_bar_helpers() {
        let b = bar("2024-03-04", dec!(50000));
        assert!(b.is_bullish());
        assert_eq!(b.body_size(), dec!(1));
        assert_eq!(b.range(), dec!(4));
    }

    #[test]
    fn test_ordering_ok() {
        let bars = vec![
            bar("2024-03-04", dec!(100)),
            bar("2024-03-05", dec!(101)),
            bar("2024-03-06", dec!(102)),
        ];
        assert_eq!(find_ordering_violation(&bars), None);
    }

    #[test]
    fn test_ordering_duplicate_date() {
        let bars = vec![bar("2024-03-04", dec!(100)), bar("2024-03-04", dec!(101))];
        assert_eq!(find_ordering_violation(&bars), Some(1));
    }

    #[test]
    fn test_ordering_descending() {
        let bars = vec![bar("2024-03-05", dec!(100)), bar("2024-03-04", dec!(101))];
        assert_eq!(find_ordering_violation(&bars), Some(1));
    }
}
