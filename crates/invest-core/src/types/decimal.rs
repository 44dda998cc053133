//! 정밀한 금융 계산을 위한 Decimal 유틸리티 및 반올림 정책.
//!
//! 이 모듈은 금액/비율 계산에 필요한 정밀 소수점 타입과
//! 시스템 전체가 공유하는 반올림 스케일 정책을 제공합니다.
//!
//! 반올림은 외부 보고 시점에만 적용합니다. 내부 연산 중간에 반올림하면
//! 오차가 누적되므로, 연쇄 계산은 항상 원본 정밀도로 수행합니다.

use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 거래 수량을 위한 타입.
pub type Quantity = Decimal;

/// 금액(원화) 타입.
pub type Money = Decimal;

/// 퍼센트 타입 (예: 5.25 = 5.25%).
pub type Percentage = Decimal;

/// 통화 금액의 소수점 자릿수 (원화 기준, 소수점 없음).
pub const CURRENCY_SCALE: u32 = 0;

/// 퍼센트 값의 소수점 자릿수.
pub const PERCENT_SCALE: u32 = 2;

/// 비율 지표(샤프, 칼마 등)의 소수점 자릿수.
pub const RATIO_SCALE: u32 = 2;

/// 통화 금액을 보고용 스케일로 반올림합니다.
pub fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(
        CURRENCY_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

/// 퍼센트 값을 보고용 스케일로 반올림합니다.
pub fn round_percent(value: Percentage) -> Percentage {
    value.round_dp_with_strategy(
        PERCENT_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

/// 비율 지표를 보고용 스케일로 반올림합니다.
pub fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        RATIO_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 지정된 소수점 자릿수로 반올림합니다 (사사오입).
    fn round_half_up(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        format!("{:.2}%", self)
    }

    fn round_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_currency_drops_fraction() {
        assert_eq!(round_currency(dec!(1550.4)), dec!(1550));
        assert_eq!(round_currency(dec!(1550.5)), dec!(1551));
        assert_eq!(round_currency(dec!(-10.5)), dec!(-11));
    }

    #[test]
    fn test_round_percent_two_digits() {
        assert_eq!(round_percent(dec!(66.6666)), dec!(66.67));
        assert_eq!(round_percent(dec!(0.005)), dec!(0.01));
    }

    #[test]
    fn test_round_ratio() {
        assert_eq!(round_ratio(dec!(4.584905)), dec!(4.58));
        assert_eq!(round_ratio(dec!(9.995)), dec!(10.00));
    }

    #[test]
    fn test_percentage_string() {
        assert_eq!(dec!(5.25).to_percentage_string(), "5.25%");
    }
}
