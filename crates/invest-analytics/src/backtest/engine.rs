//! 백테스트 실행 엔진.
//!
//! 이동평균 골든/데드 크로스 전략을 FLAT/LONG 상태 기계로 재생합니다.
//!
//! # 실행 규칙
//!
//! - 진입: FLAT 상태에서 골든 크로스 발생 시 가용 현금 전액으로 매수
//! - 청산: LONG 상태에서 데드 크로스, 손절가 이탈, 익절가 도달 시 전량 매도
//! - 체결 시점: 설정에 따라 신호 봉 종가 또는 다음 봉 시가
//!   (손절/익절은 정책과 무관하게 트리거 가격으로 당일 체결)
//! - 시리즈 종료 시 미청산 포지션은 마지막 봉 종가로 강제 청산하고
//!   전략 청산과 구분해 표시
//!
//! 청산마다 합성된 매수/매도 거래 쌍을 FIFO 매칭 엔진에 통과시켜
//! 실현 손익과 R배수를 계산합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use invest_analytics::{BacktestConfig, BacktestEngine};
//! use rust_decimal_macros::dec;
//!
//! let config = BacktestConfig::new(dec!(10_000_000))
//!     .with_periods(5, 20)
//!     .with_stop_loss_pct(dec!(5));
//!
//! let report = BacktestEngine::new(config).run(&bars)?;
//! println!("{}", report.summary());
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use invest_core::{
    find_ordering_violation, round_currency, round_percent, BacktestDefaults, Money, Price,
    PriceBar, Quantity, RiskThresholds, Transaction,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BacktestError;
use crate::fifo::FifoMatcher;
use crate::indicators::{dead_cross, golden_cross, TrendIndicators};
use crate::performance::{compute_metrics, EquityPoint, RiskMetrics, StreakStats};

/// 합성 거래에 부여하는 계좌 ID (실계좌와 충돌하지 않는 값)
const SIMULATED_ACCOUNT_ID: i64 = 0;

/// 체결 시점 정책.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// 신호 봉 종가 체결
    #[default]
    BarClose,
    /// 다음 봉 시가 체결 (신호 지연 1봉)
    NextBarOpen,
}

/// 백테스트 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 초기 자본금
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Money,

    /// 단기 이동평균 기간
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,

    /// 장기 이동평균 기간
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,

    /// 거래 수수료율 (예: 0.00015 = 0.015%)
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,

    /// 손절 폭 (%, 진입가 대비 하락률)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<Decimal>,

    /// 익절 폭 (%, 진입가 대비 상승률)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<Decimal>,

    /// 무위험 이자율 (연간, 연율화 계산용)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// 체결 시점 정책
    #[serde(default)]
    pub execution: ExecutionPolicy,

    /// 시뮬레이션 종목 코드
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

// 설정 기본값 함수들 (serde default용)
fn default_initial_capital() -> Money {
    BacktestDefaults::default().initial_capital
}
fn default_fast_period() -> usize {
    BacktestDefaults::default().fast_period
}
fn default_slow_period() -> usize {
    BacktestDefaults::default().slow_period
}
fn default_commission_rate() -> Decimal {
    BacktestDefaults::default().commission_rate
}
fn default_risk_free_rate() -> f64 {
    BacktestDefaults::default().risk_free_rate
}
fn default_symbol() -> String {
    "BACKTEST".to_string()
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self::from_defaults(&BacktestDefaults::default())
    }
}

impl BacktestConfig {
    /// 초기 자본금으로 설정을 생성합니다.
    pub fn new(initial_capital: Money) -> Self {
        Self {
            initial_capital,
            ..Self::default()
        }
    }

    /// 설정 파일의 백테스트 기본값에서 생성합니다.
    pub fn from_defaults(defaults: &BacktestDefaults) -> Self {
        Self {
            initial_capital: defaults.initial_capital,
            fast_period: defaults.fast_period,
            slow_period: defaults.slow_period,
            commission_rate: defaults.commission_rate,
            stop_loss_pct: None,
            take_profit_pct: None,
            risk_free_rate: defaults.risk_free_rate,
            execution: ExecutionPolicy::default(),
            symbol: default_symbol(),
        }
    }

    /// 이동평균 기간 설정.
    pub fn with_periods(mut self, fast: usize, slow: usize) -> Self {
        self.fast_period = fast;
        self.slow_period = slow;
        self
    }

    /// 수수료율 설정.
    pub fn with_commission_rate(mut self, rate: Decimal) -> Self {
        self.commission_rate = rate;
        self
    }

    /// 손절 폭 설정 (%).
    pub fn with_stop_loss_pct(mut self, pct: Decimal) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    /// 익절 폭 설정 (%).
    pub fn with_take_profit_pct(mut self, pct: Decimal) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    /// 무위험 이자율 설정.
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// 체결 시점 정책 설정.
    pub fn with_execution(mut self, policy: ExecutionPolicy) -> Self {
        self.execution = policy;
        self
    }

    /// 종목 코드 설정.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// 설정 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(
                "초기 자본금은 0보다 커야 합니다".to_string(),
            ));
        }
        if self.fast_period == 0 || self.fast_period >= self.slow_period {
            return Err(BacktestError::InvalidConfig(format!(
                "이동평균 기간이 잘못되었습니다: 단기 {} / 장기 {}",
                self.fast_period, self.slow_period
            )));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(BacktestError::InvalidConfig(
                "수수료율은 [0, 1) 범위여야 합니다".to_string(),
            ));
        }
        if let Some(pct) = self.stop_loss_pct {
            if pct <= Decimal::ZERO || pct >= dec!(100) {
                return Err(BacktestError::InvalidConfig(
                    "손절 폭은 (0, 100)% 범위여야 합니다".to_string(),
                ));
            }
        }
        if let Some(pct) = self.take_profit_pct {
            if pct <= Decimal::ZERO {
                return Err(BacktestError::InvalidConfig(
                    "익절 폭은 0보다 커야 합니다".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// 보유 중인 포지션.
#[derive(Debug, Clone)]
struct OpenPosition {
    quantity: Quantity,
    entry_price: Price,
    entry_commission: Money,
    entry_time: DateTime<Utc>,
    stop_price: Option<Price>,
    take_profit_price: Option<Price>,
}

/// 백테스트 결과 보고서.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 실행 고유 ID
    pub run_id: Uuid,
    /// 사용된 설정
    pub config: BacktestConfig,
    /// 시작일
    pub start_date: NaiveDate,
    /// 종료일
    pub end_date: NaiveDate,
    /// 일봉 수
    pub data_points: usize,
    /// 최종 자산
    pub final_equity: Money,
    /// 총 수익률 (%)
    pub total_return_pct: Decimal,
    /// 자산 곡선 (봉마다 1점)
    pub equity_curve: Vec<EquityPoint>,
    /// 청산 거래 목록
    pub closed_trades: Vec<invest_core::ClosedTrade>,
    /// 성과/리스크 지표
    pub metrics: RiskMetrics,
    /// 연승/연패 통계
    pub streaks: StreakStats,
    /// 강제 청산 발생 여부
    pub forced_close: bool,
}

impl BacktestReport {
    /// 사람이 읽기 좋은 요약 문자열을 생성합니다.
    pub fn summary(&self) -> String {
        format!(
            "백테스트 결과 [{}]\n\
             기간: {} ~ {} ({}봉)\n\
             총 수익률: {}% | 최종 자산: {}\n\
             거래 수: {} (승 {} / 패 {}) | 승률: {}%\n\
             샤프: {} | 소르티노: {} | 칼마: {}\n\
             최대 낙폭: {}% | 변동성: {}% | 리스크 등급: {}",
            self.run_id,
            self.start_date,
            self.end_date,
            self.data_points,
            self.total_return_pct,
            self.final_equity,
            self.metrics.total_trades,
            self.metrics.winning_trades,
            self.metrics.losing_trades,
            self.metrics.win_rate_pct,
            self.metrics.sharpe_ratio,
            self.metrics.sortino_ratio,
            self.metrics.calmar_ratio,
            self.metrics.max_drawdown_pct,
            self.metrics.volatility_pct,
            self.metrics.risk_level,
        )
    }
}

/// 백테스트 엔진.
#[derive(Debug)]
pub struct BacktestEngine {
    config: BacktestConfig,
    thresholds: RiskThresholds,
}

impl BacktestEngine {
    /// 설정으로 엔진을 생성합니다. 리스크 임계값은 기본값을 사용합니다.
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            thresholds: RiskThresholds::default(),
        }
    }

    /// 리스크 등급 분류 임계값 설정.
    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// 일봉 배열에 대해 백테스트를 실행합니다.
    ///
    /// 일봉은 날짜 오름차순이어야 하며, 최소 `slow_period + 1`개가
    /// 필요합니다. 위반 시 루프 시작 전에 실패합니다.
    pub fn run(&self, bars: &[PriceBar]) -> Result<BacktestReport, BacktestError> {
        self.config.validate()?;

        if let Some(i) = find_ordering_violation(bars) {
            return Err(BacktestError::MalformedInput(format!(
                "일봉 {}번의 날짜가 직전 봉보다 늦지 않습니다",
                i
            )));
        }

        let required = self.config.slow_period + 1;
        if bars.len() < required {
            return Err(BacktestError::InsufficientHistory {
                required,
                provided: bars.len(),
            });
        }

        let trend = TrendIndicators::new();
        let fast = trend.sma(bars, self.config.fast_period)?;
        let slow = trend.sma(bars, self.config.slow_period)?;

        tracing::info!(
            symbol = %self.config.symbol,
            bars = bars.len(),
            fast = self.config.fast_period,
            slow = self.config.slow_period,
            "백테스트 시작"
        );

        let mut cash = self.config.initial_capital;
        let mut position: Option<OpenPosition> = None;
        let mut pending_entry = false;
        let mut pending_exit = false;
        let mut closed_trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut next_tx_id: i64 = 1;
        let mut forced_close = false;

        for (i, bar) in bars.iter().enumerate() {
            let bar_open_time = bar_time(bar.date);

            // 전일 신호의 시가 체결 (NextBarOpen 정책)
            if pending_exit {
                pending_exit = false;
                if let Some(open) = position.take() {
                    let trade = self.close_position(
                        &open,
                        bar.open,
                        bar_open_time,
                        false,
                        &mut cash,
                        &mut next_tx_id,
                    )?;
                    closed_trades.push(trade);
                }
            }
            if pending_entry {
                pending_entry = false;
                position = self.open_position(bar.open, bar_open_time, &mut cash);
            }

            // 손절/익절은 체결 정책과 무관하게 트리거 가격으로 당일 체결
            let trigger = position.as_ref().and_then(|open| {
                if let Some(stop) = open.stop_price {
                    if bar.low <= stop {
                        return Some(stop);
                    }
                }
                if let Some(tp) = open.take_profit_price {
                    if bar.high >= tp {
                        return Some(tp);
                    }
                }
                None
            });
            if let Some(price) = trigger {
                if let Some(open) = position.take() {
                    let trade = self.close_position(
                        &open,
                        price,
                        bar_open_time,
                        false,
                        &mut cash,
                        &mut next_tx_id,
                    )?;
                    closed_trades.push(trade);
                }
            }

            // 크로스 신호: 전일/당일 이동평균이 모두 유효할 때만 평가
            if i >= self.config.slow_period {
                if let (Some(pf), Some(cf), Some(ps), Some(cs)) =
                    (fast[i - 1], fast[i], slow[i - 1], slow[i])
                {
                    if position.is_none() && !pending_entry && golden_cross(pf, cf, ps, cs) {
                        match self.config.execution {
                            ExecutionPolicy::BarClose => {
                                position = self.open_position(bar.close, bar_open_time, &mut cash);
                            }
                            ExecutionPolicy::NextBarOpen => pending_entry = true,
                        }
                    } else if position.is_some() && dead_cross(pf, cf, ps, cs) {
                        match self.config.execution {
                            ExecutionPolicy::BarClose => {
                                if let Some(open) = position.take() {
                                    let trade = self.close_position(
                                        &open,
                                        bar.close,
                                        bar_open_time,
                                        false,
                                        &mut cash,
                                        &mut next_tx_id,
                                    )?;
                                    closed_trades.push(trade);
                                }
                            }
                            ExecutionPolicy::NextBarOpen => pending_exit = true,
                        }
                    }
                }
            }

            let held_value = position
                .as_ref()
                .map_or(Decimal::ZERO, |p| p.quantity * bar.close);
            equity_curve.push(EquityPoint::new(bar.date, cash + held_value));
        }

        // 시리즈 종료: 미청산 포지션은 마지막 종가로 강제 청산
        if let Some(open) = position.take() {
            // run() 진입부에서 길이를 검증했으므로 마지막 봉은 항상 존재
            if let Some(last) = bars.last() {
                let trade = self.close_position(
                    &open,
                    last.close,
                    bar_time(last.date),
                    true,
                    &mut cash,
                    &mut next_tx_id,
                )?;
                closed_trades.push(trade);
                forced_close = true;
                if let Some(point) = equity_curve.last_mut() {
                    point.equity = cash;
                }
            }
        }

        let metrics = compute_metrics(
            &closed_trades,
            &equity_curve,
            self.config.risk_free_rate,
            &self.thresholds,
        )?;
        let streaks = StreakStats::from_trades(&closed_trades);

        let final_equity = cash;
        let total_return_pct = round_percent(
            (final_equity / self.config.initial_capital - Decimal::ONE) * Decimal::ONE_HUNDRED,
        );

        tracing::info!(
            trades = closed_trades.len(),
            total_return_pct = %total_return_pct,
            forced_close,
            "백테스트 완료"
        );

        Ok(BacktestReport {
            run_id: Uuid::new_v4(),
            start_date: bars[0].date,
            end_date: bars[bars.len() - 1].date,
            data_points: bars.len(),
            final_equity,
            total_return_pct,
            equity_curve,
            closed_trades,
            metrics,
            streaks,
            forced_close,
            config: self.config.clone(),
        })
    }

    /// 가용 현금 전액으로 포지션을 엽니다.
    ///
    /// 수수료를 포함해 1주도 살 수 없으면 진입하지 않습니다.
    fn open_position(
        &self,
        price: Price,
        time: DateTime<Utc>,
        cash: &mut Money,
    ) -> Option<OpenPosition> {
        if price <= Decimal::ZERO {
            return None;
        }

        let quantity = (*cash / (price * (Decimal::ONE + self.config.commission_rate))).floor();
        if quantity < Decimal::ONE {
            return None;
        }

        let commission = round_currency(quantity * price * self.config.commission_rate);
        *cash -= quantity * price + commission;

        let pct = Decimal::ONE_HUNDRED;
        let stop_price = self
            .config
            .stop_loss_pct
            .map(|p| price * (Decimal::ONE - p / pct));
        let take_profit_price = self
            .config
            .take_profit_pct
            .map(|p| price * (Decimal::ONE + p / pct));

        tracing::debug!(%price, %quantity, %commission, "포지션 진입");

        Some(OpenPosition {
            quantity,
            entry_price: price,
            entry_commission: commission,
            entry_time: time,
            stop_price,
            take_profit_price,
        })
    }

    /// 포지션 전량을 청산하고 FIFO 매칭으로 청산 거래를 생성합니다.
    fn close_position(
        &self,
        open: &OpenPosition,
        price: Price,
        time: DateTime<Utc>,
        forced: bool,
        cash: &mut Money,
        next_tx_id: &mut i64,
    ) -> Result<invest_core::ClosedTrade, BacktestError> {
        let commission = round_currency(open.quantity * price * self.config.commission_rate);
        *cash += open.quantity * price - commission;

        let buy_id = *next_tx_id;
        let sell_id = buy_id + 1;
        *next_tx_id += 2;

        let mut buy = Transaction::buy(
            buy_id,
            SIMULATED_ACCOUNT_ID,
            self.config.symbol.clone(),
            open.quantity,
            open.entry_price,
            open.entry_time,
        )
        .with_commission(open.entry_commission);
        if let Some(stop) = open.stop_price {
            buy = buy.with_stop_loss(stop);
        }

        let sell = Transaction::sell(
            sell_id,
            SIMULATED_ACCOUNT_ID,
            self.config.symbol.clone(),
            open.quantity,
            price,
            time,
        )
        .with_commission(commission);

        let result = FifoMatcher::new().match_transactions(
            SIMULATED_ACCOUNT_ID,
            &self.config.symbol,
            &[buy, sell],
        )?;

        let mut trade = result.closed_trades.into_iter().next().ok_or_else(|| {
            BacktestError::MalformedInput("전량 매도에서 청산 거래가 생성되지 않았습니다".to_string())
        })?;
        trade.forced_close = forced;

        tracing::debug!(%price, pnl = %trade.realized_pnl, forced, "포지션 청산");

        Ok(trade)
    }
}

fn bar_time(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
