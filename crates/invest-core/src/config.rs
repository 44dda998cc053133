//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 리스크 등급 분류 임계값과 반올림 스케일은 엔진 로직이 아니라
//! 설정이므로 여기에서 공급합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 반올림 정책 설정
    #[serde(default)]
    pub rounding: RoundingConfig,
    /// 리스크 등급 분류 임계값
    #[serde(default)]
    pub risk: RiskThresholds,
    /// 백테스트 기본값
    #[serde(default)]
    pub backtest: BacktestDefaults,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 반올림 정책 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoundingConfig {
    /// 통화 금액 소수점 자릿수 (원화 기준 0)
    pub currency_scale: u32,
    /// 퍼센트 소수점 자릿수
    pub percent_scale: u32,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            currency_scale: 0,
            percent_scale: 2,
        }
    }
}

/// 리스크 등급 분류 임계값.
///
/// HIGH: 어느 한 지표라도 high 임계값을 넘으면.
/// MEDIUM: 어느 한 지표라도 medium 임계값을 넘으면.
/// LOW: 그 외.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskThresholds {
    /// 연율화 변동성 HIGH 임계값 (%, 이상이면 HIGH)
    pub volatility_high_pct: Decimal,
    /// 연율화 변동성 MEDIUM 임계값 (%)
    pub volatility_medium_pct: Decimal,
    /// 최대 낙폭 HIGH 임계값 (%)
    pub max_drawdown_high_pct: Decimal,
    /// 최대 낙폭 MEDIUM 임계값 (%)
    pub max_drawdown_medium_pct: Decimal,
    /// 샤프 비율 HIGH 임계값 (이하이면 HIGH - 낮을수록 위험)
    pub sharpe_high_below: Decimal,
    /// 샤프 비율 MEDIUM 임계값 (이하이면 MEDIUM)
    pub sharpe_medium_below: Decimal,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            volatility_high_pct: Decimal::new(40, 0),
            volatility_medium_pct: Decimal::new(20, 0),
            max_drawdown_high_pct: Decimal::new(30, 0),
            max_drawdown_medium_pct: Decimal::new(15, 0),
            sharpe_high_below: Decimal::ZERO,
            sharpe_medium_below: Decimal::ONE,
        }
    }
}

/// 백테스트 기본값.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BacktestDefaults {
    /// 초기 자본금
    pub initial_capital: Decimal,
    /// 거래 수수료율 (예: 0.00015 = 0.015%)
    pub commission_rate: Decimal,
    /// 무위험 이자율 (연간, 예: 0.035 = 3.5%)
    pub risk_free_rate: f64,
    /// 단기 이동평균 기간
    pub fast_period: usize,
    /// 장기 이동평균 기간
    pub slow_period: usize,
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::new(10_000_000, 0),
            commission_rate: Decimal::new(15, 5),
            risk_free_rate: 0.035,
            fast_period: 5,
            slow_period: 20,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드 (예: INVEST__RISK__VOLATILITY_HIGH_PCT)
            .add_source(
                config::Environment::with_prefix("INVEST")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.risk.volatility_high_pct, dec!(40));
        assert_eq!(config.risk.max_drawdown_medium_pct, dec!(15));
        assert_eq!(config.rounding.currency_scale, 0);
    }

    #[test]
    fn test_default_backtest() {
        let defaults = BacktestDefaults::default();
        assert_eq!(defaults.initial_capital, dec!(10000000));
        assert!(defaults.fast_period < defaults.slow_period);
    }
}
