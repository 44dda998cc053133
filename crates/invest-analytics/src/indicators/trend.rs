//! 추세 지표 (이동평균 및 크로스 감지).
//!
//! 모든 함수는 일봉 종가 기준으로 계산합니다.
//!
//! EMA는 경로 의존적이므로 임의 시점 `i`의 값이 필요하면 0번 봉부터
//! 다시 계산해야 합니다. 이 모듈은 호출마다 처음부터 재계산하는 전략을
//! 사용합니다 (호출당 O(n)). 증분 캐시보다 정확성이 우선입니다.

use invest_core::PriceBar;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{IndicatorError, IndicatorResult};

/// 추세 지표 계산기.
#[derive(Debug, Default)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 시점 `i`의 단순 이동평균 (SMA).
    ///
    /// `[i-period+1, i]` 구간 종가의 산술 평균입니다.
    /// `i >= period-1`이어야 하며, 아니면 이력 부족 오류를 반환합니다.
    pub fn sma_at(&self, bars: &[PriceBar], i: usize, period: usize) -> IndicatorResult<Decimal> {
        self.check_window(bars, i, period)?;

        let sum: Decimal = bars[i + 1 - period..=i].iter().map(|b| b.close).sum();
        Ok(sum / Decimal::from(period))
    }

    /// 시점 `i`의 지수 이동평균 (EMA).
    ///
    /// 첫 `period`개 봉의 SMA를 시드로 삼고, 이후
    /// `ema_t = close_t × k + ema_{t-1} × (1-k)`, `k = 2/(period+1)`을
    /// `i`번 봉까지 적용합니다. 매 호출마다 0번 봉부터 재계산합니다.
    pub fn ema_at(&self, bars: &[PriceBar], i: usize, period: usize) -> IndicatorResult<Decimal> {
        self.check_window(bars, i, period)?;

        let multiplier = dec!(2) / Decimal::from(period + 1);
        let mut ema: Decimal =
            bars[..period].iter().map(|b| b.close).sum::<Decimal>() / Decimal::from(period);

        for bar in bars.iter().take(i + 1).skip(period) {
            ema = bar.close * multiplier + ema * (Decimal::ONE - multiplier);
        }

        Ok(ema)
    }

    /// 시점 `i`의 모집단 표준편차.
    ///
    /// `[i-period+1, i]` 구간 종가에 대해, 미리 계산된 평균 `mean`을
    /// 기준으로 계산합니다. 제곱근은 부동소수점으로 계산하되 결과는
    /// Decimal로 반환합니다 (반올림은 보고 시점에만).
    pub fn stddev_at(
        &self,
        bars: &[PriceBar],
        i: usize,
        period: usize,
        mean: Decimal,
    ) -> IndicatorResult<Decimal> {
        self.check_window(bars, i, period)?;

        let variance: Decimal = bars[i + 1 - period..=i]
            .iter()
            .map(|b| {
                let diff = b.close - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / Decimal::from(period);

        let stddev = variance.to_f64().unwrap_or(0.0).sqrt();
        Decimal::from_f64(stddev).ok_or_else(|| {
            IndicatorError::InvalidParameter("표준편차가 유한한 값이 아님".to_string())
        })
    }

    /// SMA 시계열 계산.
    ///
    /// # 반환
    /// 각 시점의 SMA 값 (처음 period-1개는 None)
    pub fn sma(&self, bars: &[PriceBar], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.check_period(bars, period)?;

        let mut result = Vec::with_capacity(bars.len());
        let period_decimal = Decimal::from(period);
        let mut window_sum = Decimal::ZERO;

        for (i, bar) in bars.iter().enumerate() {
            window_sum += bar.close;
            if i >= period {
                window_sum -= bars[i - period].close;
            }

            if i < period - 1 {
                result.push(None);
            } else {
                result.push(Some(window_sum / period_decimal));
            }
        }

        Ok(result)
    }

    /// EMA 시계열 계산.
    ///
    /// # 반환
    /// 각 시점의 EMA 값 (처음 period-1개는 None)
    pub fn ema(&self, bars: &[PriceBar], period: usize) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.check_period(bars, period)?;

        let mut result = Vec::with_capacity(bars.len());
        let multiplier = dec!(2) / Decimal::from(period + 1);

        // 처음 period-1개는 None
        for _ in 0..period - 1 {
            result.push(None);
        }

        // 첫 EMA는 SMA로 시작
        let initial_sma: Decimal =
            bars[..period].iter().map(|b| b.close).sum::<Decimal>() / Decimal::from(period);
        result.push(Some(initial_sma));

        let mut prev_ema = initial_sma;
        for bar in bars.iter().skip(period) {
            let ema = bar.close * multiplier + prev_ema * (Decimal::ONE - multiplier);
            result.push(Some(ema));
            prev_ema = ema;
        }

        Ok(result)
    }

    fn check_period(&self, bars: &[PriceBar], period: usize) -> IndicatorResult<()> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "기간은 0보다 커야 합니다".to_string(),
            ));
        }
        if bars.len() < period {
            return Err(IndicatorError::InsufficientHistory {
                required: period,
                provided: bars.len(),
            });
        }
        Ok(())
    }

    fn check_window(&self, bars: &[PriceBar], i: usize, period: usize) -> IndicatorResult<()> {
        self.check_period(bars, period)?;
        if i >= bars.len() {
            return Err(IndicatorError::InvalidParameter(format!(
                "인덱스 {}가 범위를 벗어남 (봉 {}개)",
                i,
                bars.len()
            )));
        }
        if i + 1 < period {
            return Err(IndicatorError::InsufficientHistory {
                required: period,
                provided: i + 1,
            });
        }
        Ok(())
    }
}

/// 임계값 상향 돌파 감지.
///
/// 돌파 이전은 비엄격, 이후는 엄격 부등호를 사용합니다
/// (`prev <= threshold < curr`). 값이 임계값 위에 정확히 걸쳐 있는 것만으로는
/// 돌파로 치지 않습니다.
pub fn crossed_above(prev: Decimal, curr: Decimal, threshold: Decimal) -> bool {
    prev <= threshold && curr > threshold
}

/// 임계값 하향 돌파 감지.
///
/// `crossed_above`와 같은 동률 규칙을 대칭으로 적용합니다
/// (`prev >= threshold > curr`).
pub fn crossed_below(prev: Decimal, curr: Decimal, threshold: Decimal) -> bool {
    prev >= threshold && curr < threshold
}

/// 골든 크로스 감지.
///
/// 단기-장기 스프레드가 0을 상향 돌파하는 시점입니다.
/// 동률 규칙은 `crossed_above`와 동일합니다.
pub fn golden_cross(
    prev_fast: Decimal,
    curr_fast: Decimal,
    prev_slow: Decimal,
    curr_slow: Decimal,
) -> bool {
    crossed_above(prev_fast - prev_slow, curr_fast - curr_slow, Decimal::ZERO)
}

/// 데드 크로스 감지.
///
/// 단기-장기 스프레드가 0을 하향 돌파하는 시점입니다.
pub fn dead_cross(
    prev_fast: Decimal,
    curr_fast: Decimal,
    prev_slow: Decimal,
    curr_slow: Decimal,
) -> bool {
    crossed_below(prev_fast - prev_slow, curr_fast - curr_slow, Decimal::ZERO)
}
