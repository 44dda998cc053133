//! 리스크 지표 계산.
//!
//! 자산 곡선에서 일간 수익률을 유도하고, 연율화 변동성·샤프·소르티노·
//! 칼마 비율과 모수적 VaR를 계산합니다. 거래 목록에서는 승률,
//! 기대값, 프로핏 팩터를 집계합니다.
//!
//! # 수치 정책
//!
//! - 통계 중간값(평균, 표준편차, 제곱근)은 f64로 계산합니다.
//! - Decimal 반올림은 보고 경계에서 단 한 번 수행합니다.
//! - 비율 상한 클램핑은 모든 산술과 반올림이 끝난 마지막 단계입니다.

use chrono::NaiveDate;
use invest_core::{
    round_currency, round_percent, round_ratio, ClosedTrade, Money, RiskThresholds,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MetricsError;

/// 연간 거래일 수 (연율화 계산에 사용)
///
/// 국내 주식 시장 기준 연간 약 252일 거래됩니다.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// 연간 달력일 수 (CAGR 계산에 사용)
pub const DAYS_PER_YEAR: u32 = 365;

/// 샤프/칼마/프로핏 팩터의 절대값 상한
///
/// 변동성이나 낙폭이 0에 가까울 때 비율이 발산하므로,
/// 표시와 후속 처리를 유한하게 유지하기 위한 상한입니다.
pub const MAX_RATIO_VALUE: Decimal = rust_decimal_macros::dec!(10.00);

/// 소르티노 비율의 절대값 상한
///
/// 음수 수익률이 전혀 없으면 하방 편차가 0이 되어 이 값으로 대체합니다.
pub const MAX_SORTINO_VALUE: Decimal = rust_decimal_macros::dec!(999.99);

/// 95% 신뢰수준 정규분포 z값
pub const VAR_CONFIDENCE_Z: f64 = 1.645;

/// 자산 곡선의 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// 평가 기준일
    pub date: NaiveDate,
    /// 해당 시점 총 자산 (현금 + 평가액)
    pub equity: Money,
}

impl EquityPoint {
    /// 새로운 자산 곡선 점 생성.
    pub fn new(date: NaiveDate, equity: Money) -> Self {
        Self { date, equity }
    }
}

/// 모수적 VaR (95% 신뢰수준).
///
/// 일간 값에 √5, √21 시간 스케일링을 적용해 주간/월간을 유도합니다.
/// 리샘플링한 수익률로 재계산하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Var95 {
    /// 일간 VaR (%)
    pub daily: Decimal,
    /// 주간 VaR (%)
    pub weekly: Decimal,
    /// 월간 VaR (%)
    pub monthly: Decimal,
}

/// 리스크 등급.
///
/// 변동성/최대 낙폭/샤프 비율 임계값으로 결정론적으로 분류합니다.
/// 임계값은 설정에서 공급받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// 낮음
    Low,
    /// 보통
    Medium,
    /// 높음
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// 성과/리스크 지표.
///
/// 비율은 소수점 2자리, 퍼센트는 소수점 2자리, 금액은 원 단위로
/// 반올림된 상태로 보고됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// 샤프 비율 (초과수익 / 총변동성)
    pub sharpe_ratio: Decimal,
    /// 소르티노 비율 (초과수익 / 하방변동성)
    pub sortino_ratio: Decimal,
    /// 칼마 비율 (CAGR / 최대 낙폭)
    pub calmar_ratio: Decimal,
    /// 연율화 변동성 (%)
    pub volatility_pct: Decimal,
    /// 최대 낙폭 (%, 양수)
    pub max_drawdown_pct: Decimal,
    /// 프로핏 팩터 (총 수익 / |총 손실|)
    pub profit_factor: Decimal,
    /// 모수적 VaR 95%
    pub var95: Var95,
    /// 리스크 등급
    pub risk_level: RiskLevel,
    /// 전체 거래 수
    pub total_trades: usize,
    /// 수익 거래 수
    pub winning_trades: usize,
    /// 손실 거래 수
    pub losing_trades: usize,
    /// 승률 (%)
    pub win_rate_pct: Decimal,
    /// 거래당 기대 수익 (원)
    pub expectancy: Decimal,
    /// 총 실현 손익 (원)
    pub total_pnl: Decimal,
}

/// 청산 거래 목록과 자산 곡선에서 리스크 지표를 계산합니다.
///
/// # 매개변수
///
/// * `trades` - 청산 완료된 거래 목록 (비어 있어도 됨)
/// * `equity_curve` - 날짜 오름차순 자산 곡선
/// * `risk_free_rate_annual` - 연간 무위험 이자율 (예: 0.035 = 3.5%)
/// * `thresholds` - 리스크 등급 분류 임계값
///
/// # 오류
///
/// 자산 곡선에서 수익률 관측치를 2개 미만으로만 유도할 수 있으면
/// `MetricsError::InsufficientData`를 반환합니다.
pub fn compute_metrics(
    trades: &[ClosedTrade],
    equity_curve: &[EquityPoint],
    risk_free_rate_annual: f64,
    thresholds: &RiskThresholds,
) -> Result<RiskMetrics, MetricsError> {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return Err(MetricsError::InsufficientData {
            required: 2,
            provided: returns.len(),
        });
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let vol_daily = population_stddev(&returns, mean);
    let vol_annual = vol_daily * (TRADING_DAYS_PER_YEAR as f64).sqrt();
    let excess_annual = mean * TRADING_DAYS_PER_YEAR as f64 - risk_free_rate_annual;

    // 샤프: 변동성 0이면 발산 대신 상한으로 대체
    let sharpe = if vol_annual == 0.0 {
        MAX_RATIO_VALUE
    } else {
        to_decimal(excess_annual / vol_annual)
    };

    // 소르티노: 음수 수익률만의 표준편차를 분모로 사용
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino = if negatives.is_empty() {
        MAX_SORTINO_VALUE
    } else {
        let neg_mean = negatives.iter().sum::<f64>() / negatives.len() as f64;
        let downside_annual =
            population_stddev(&negatives, neg_mean) * (TRADING_DAYS_PER_YEAR as f64).sqrt();
        if downside_annual == 0.0 {
            MAX_SORTINO_VALUE
        } else {
            to_decimal(excess_annual / downside_annual)
        }
    };

    let mdd_pct = max_drawdown_pct(equity_curve);

    // 칼마: CAGR / 최대 낙폭, 낙폭 0이면 상한
    let calmar = if mdd_pct == 0.0 {
        MAX_RATIO_VALUE
    } else {
        to_decimal(cagr(equity_curve) * 100.0 / mdd_pct)
    };

    let var_daily = VAR_CONFIDENCE_Z * vol_daily * 100.0;
    let var95 = Var95 {
        daily: round_percent(to_decimal(var_daily)),
        weekly: round_percent(to_decimal(var_daily * 5.0_f64.sqrt())),
        monthly: round_percent(to_decimal(var_daily * 21.0_f64.sqrt())),
    };

    let trade_stats = aggregate_trades(trades);

    let volatility_pct = round_percent(to_decimal(vol_annual * 100.0));
    let max_drawdown_pct = round_percent(to_decimal(mdd_pct));

    // 반올림 후 클램핑이 마지막 단계
    let sharpe_ratio = clamp_ratio(round_ratio(sharpe), MAX_RATIO_VALUE);
    let sortino_ratio = clamp_ratio(round_ratio(sortino), MAX_SORTINO_VALUE);
    let calmar_ratio = clamp_ratio(round_ratio(calmar), MAX_RATIO_VALUE);
    let profit_factor = clamp_ratio(round_ratio(trade_stats.profit_factor), MAX_RATIO_VALUE);

    let risk_level = classify_risk(volatility_pct, max_drawdown_pct, sharpe_ratio, thresholds);

    Ok(RiskMetrics {
        sharpe_ratio,
        sortino_ratio,
        calmar_ratio,
        volatility_pct,
        max_drawdown_pct,
        profit_factor,
        var95,
        risk_level,
        total_trades: trade_stats.total,
        winning_trades: trade_stats.winners,
        losing_trades: trade_stats.losers,
        win_rate_pct: round_percent(trade_stats.win_rate_pct),
        expectancy: round_currency(trade_stats.expectancy),
        total_pnl: round_currency(trade_stats.total_pnl),
    })
}

/// 자산 곡선에서 일간 수익률을 유도합니다 (`r_t = e_t / e_{t-1} - 1`).
///
/// 직전 자산이 0 이하인 구간은 수익률을 정의할 수 없으므로 건너뜁니다.
fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter_map(|w| {
            let prev = w[0].equity.to_f64()?;
            let curr = w[1].equity.to_f64()?;
            if prev > 0.0 {
                Some(curr / prev - 1.0)
            } else {
                None
            }
        })
        .collect()
}

/// 모집단 표준편차.
fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// 최대 낙폭 (%, 양수).
///
/// 각 시점의 직전 고점 대비 하락률 중 최댓값입니다.
fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut mdd = 0.0_f64;

    for point in equity_curve {
        let equity = point.equity.to_f64().unwrap_or(0.0);
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let drawdown = (peak - equity) / peak;
            if drawdown > mdd {
                mdd = drawdown;
            }
        }
    }

    mdd * 100.0
}

/// 연복리 수익률 (CAGR, 소수).
///
/// 첫/마지막 자산과 경과 달력일로 계산합니다. 경과일이 0이면
/// 단순 수익률을 반환합니다.
fn cagr(equity_curve: &[EquityPoint]) -> f64 {
    let (first, last) = match (equity_curve.first(), equity_curve.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return 0.0,
    };

    let initial = first.equity.to_f64().unwrap_or(0.0);
    let ending = last.equity.to_f64().unwrap_or(0.0);
    if initial <= 0.0 || ending <= 0.0 {
        return 0.0;
    }

    let days = (last.date - first.date).num_days();
    if days <= 0 {
        return ending / initial - 1.0;
    }

    (ending / initial).powf(DAYS_PER_YEAR as f64 / days as f64) - 1.0
}

struct TradeAggregates {
    total: usize,
    winners: usize,
    losers: usize,
    win_rate_pct: Decimal,
    expectancy: Decimal,
    total_pnl: Decimal,
    profit_factor: Decimal,
}

/// 거래 목록 집계 (승률, 기대값, 프로핏 팩터).
fn aggregate_trades(trades: &[ClosedTrade]) -> TradeAggregates {
    let total = trades.len();
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    let losers = trades.iter().filter(|t| t.realized_pnl < Decimal::ZERO).count();

    let total_pnl: Decimal = trades.iter().map(|t| t.realized_pnl).sum();
    let gross_profit: Decimal = trades
        .iter()
        .filter(|t| t.realized_pnl > Decimal::ZERO)
        .map(|t| t.realized_pnl)
        .sum();
    let gross_loss: Decimal = trades
        .iter()
        .filter(|t| t.realized_pnl < Decimal::ZERO)
        .map(|t| t.realized_pnl.abs())
        .sum();

    let (win_rate_pct, expectancy) = if total == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let count = Decimal::from(total);
        (
            Decimal::from(winners) / count * Decimal::ONE_HUNDRED,
            total_pnl / count,
        )
    };

    let profit_factor = if gross_loss == Decimal::ZERO {
        if gross_profit > Decimal::ZERO {
            MAX_RATIO_VALUE
        } else {
            Decimal::ZERO
        }
    } else {
        gross_profit / gross_loss
    };

    TradeAggregates {
        total,
        winners,
        losers,
        win_rate_pct,
        expectancy,
        total_pnl,
        profit_factor,
    }
}

/// 리스크 등급 분류.
///
/// HIGH: 어느 한 지표라도 high 임계값을 넘으면 (샤프는 이하이면).
/// MEDIUM: 어느 한 지표라도 medium 임계값을 넘으면.
/// LOW: 그 외.
fn classify_risk(
    volatility_pct: Decimal,
    max_drawdown_pct: Decimal,
    sharpe_ratio: Decimal,
    thresholds: &RiskThresholds,
) -> RiskLevel {
    if volatility_pct >= thresholds.volatility_high_pct
        || max_drawdown_pct >= thresholds.max_drawdown_high_pct
        || sharpe_ratio <= thresholds.sharpe_high_below
    {
        RiskLevel::High
    } else if volatility_pct >= thresholds.volatility_medium_pct
        || max_drawdown_pct >= thresholds.max_drawdown_medium_pct
        || sharpe_ratio <= thresholds.sharpe_medium_below
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn clamp_ratio(value: Decimal, cap: Decimal) -> Decimal {
    value.clamp(-cap, cap)
}

/// f64 중간값을 Decimal로 변환합니다.
///
/// Decimal 범위를 넘는 값(무한대 포함)은 부호 방향으로 포화시켜,
/// 이후의 클램핑이 0이 아니라 상한으로 귀결되게 합니다.
fn to_decimal(value: f64) -> Decimal {
    if value.is_nan() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
