//! 연승/연패 통계.

use invest_core::ClosedTrade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 연승/연패 통계.
///
/// 거래는 청산 순서대로 공급되어야 합니다. 손익이 정확히 0인 거래는
/// 승도 패도 아니므로 진행 중인 연속 기록을 끊습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    /// 최대 연승 횟수
    pub max_win_streak: u32,
    /// 최대 연패 횟수
    pub max_loss_streak: u32,
    /// 현재 진행 중인 연속 기록 (양수 = 연승, 음수 = 연패)
    pub current_streak: i32,
}

impl StreakStats {
    /// 청산 거래 목록에서 연승/연패 통계를 계산합니다.
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut stats = Self::default();

        for trade in trades {
            if trade.realized_pnl > Decimal::ZERO {
                stats.current_streak = if stats.current_streak > 0 {
                    stats.current_streak + 1
                } else {
                    1
                };
                stats.max_win_streak = stats.max_win_streak.max(stats.current_streak as u32);
            } else if trade.realized_pnl < Decimal::ZERO {
                stats.current_streak = if stats.current_streak < 0 {
                    stats.current_streak - 1
                } else {
                    -1
                };
                stats.max_loss_streak = stats
                    .max_loss_streak
                    .max(stats.current_streak.unsigned_abs());
            } else {
                stats.current_streak = 0;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal) -> ClosedTrade {
        ClosedTrade {
            sell_transaction_id: 1,
            symbol: "005930".to_string(),
            account_id: 1,
            quantity_closed: dec!(10),
            sell_proceeds: dec!(1000000) + pnl,
            cost_basis_consumed: dec!(1000000),
            commission_total: Decimal::ZERO,
            realized_pnl: pnl,
            holding_period_days: dec!(3),
            r_multiple: None,
            closed_at: Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap(),
            forced_close: false,
        }
    }

    fn trades(pnls: &[i64]) -> Vec<ClosedTrade> {
        pnls.iter().map(|p| trade(Decimal::from(*p))).collect()
    }

    #[test]
    fn test_empty_trades() {
        let stats = StreakStats::from_trades(&[]);
        assert_eq!(stats, StreakStats::default());
    }

    #[test]
    fn test_alternating_streaks() {
        let stats = StreakStats::from_trades(&trades(&[100, 200, 300, -50, -60, 10]));
        assert_eq!(stats.max_win_streak, 3);
        assert_eq!(stats.max_loss_streak, 2);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_ending_in_losses() {
        let stats = StreakStats::from_trades(&trades(&[100, -10, -20, -30]));
        assert_eq!(stats.max_win_streak, 1);
        assert_eq!(stats.max_loss_streak, 3);
        assert_eq!(stats.current_streak, -3);
    }

    #[test]
    fn test_breakeven_resets_streak() {
        let stats = StreakStats::from_trades(&trades(&[100, 200, 0, 300]));
        assert_eq!(stats.max_win_streak, 2);
        assert_eq!(stats.current_streak, 1);
    }
}
