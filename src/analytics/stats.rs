use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Trade;

/// Trailing window used for the rolling win rate when none is requested.
pub const DEFAULT_ROLLING_WINDOW: usize = 5;

/// Aggregate statistics for a sequence of trades, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: Decimal,
    pub win_loss_ratio: Decimal,
    pub average_r: Decimal,
    pub equity_curve: Vec<EquityPoint>,
    pub rolling_win_rate: Vec<Decimal>,
    pub drawdown: Vec<Decimal>,
    pub cumulative_frequency: Vec<FrequencyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub equity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    pub pnl: Decimal,
    pub percentile: Decimal,
}

/// Compute every statistic in one call. The caller decides the order of
/// `trades`; nothing here sorts except the frequency distribution.
pub fn compute_stats(trades: &[Trade], window: usize) -> TradeStats {
    let pnls = signed_pnls(trades);
    let (wins, losses) = win_loss_counts(&pnls);
    let total_pnl = total_pnl(&pnls);
    let equity_curve = equity_curve(trades);
    let equity: Vec<Decimal> = equity_curve.iter().map(|p| p.equity).collect();

    TradeStats {
        count: trades.len(),
        wins,
        losses,
        total_pnl,
        win_loss_ratio: win_loss_ratio(wins, losses),
        average_r: average_r(&pnls),
        rolling_win_rate: rolling_win_rate(&pnls, window),
        drawdown: drawdown_series(&equity),
        cumulative_frequency: cumulative_frequency(&pnls),
        equity_curve,
    }
}

pub fn signed_pnls(trades: &[Trade]) -> Vec<Decimal> {
    trades.iter().map(Trade::signed_pnl).collect()
}

fn is_win(pnl: &Decimal) -> bool {
    *pnl > Decimal::ZERO
}

// ---------------------------------------------------------------------------
// Counts and totals
// ---------------------------------------------------------------------------

/// `(wins, losses)`. A P&L of exactly zero counts as a loss.
pub fn win_loss_counts(pnls: &[Decimal]) -> (usize, usize) {
    let wins = pnls.iter().filter(|p| is_win(p)).count();
    (wins, pnls.len() - wins)
}

/// Sum of signed P&L, saturating at the `Decimal` range.
pub fn total_pnl(pnls: &[Decimal]) -> Decimal {
    pnls.iter().fold(Decimal::ZERO, |acc, p| acc.saturating_add(*p))
}

/// wins / max(losses, 1).
pub fn win_loss_ratio(wins: usize, losses: usize) -> Decimal {
    Decimal::from(wins as u64) / Decimal::from(losses.max(1) as u64)
}

/// Mean signed P&L, zero for an empty sequence.
pub fn average_r(pnls: &[Decimal]) -> Decimal {
    if pnls.is_empty() {
        return Decimal::ZERO;
    }
    total_pnl(pnls) / Decimal::from(pnls.len() as u64)
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Running sum of signed P&L, one point per trade.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut equity = Decimal::ZERO;
    trades
        .iter()
        .map(|t| {
            equity = equity.saturating_add(t.signed_pnl());
            EquityPoint {
                timestamp: t.ordering_key(),
                equity,
            }
        })
        .collect()
}

/// Fraction of wins over `[max(0, i - window + 1), i]` for each index.
/// A window of zero is treated as one.
pub fn rolling_win_rate(pnls: &[Decimal], window: usize) -> Vec<Decimal> {
    let window = window.max(1);
    let mut wins_in_window = 0usize;

    pnls.iter()
        .enumerate()
        .map(|(i, pnl)| {
            if is_win(pnl) {
                wins_in_window += 1;
            }
            if i >= window && is_win(&pnls[i - window]) {
                wins_in_window -= 1;
            }
            let len = (i + 1).min(window);
            Decimal::from(wins_in_window as u64) / Decimal::from(len as u64)
        })
        .collect()
}

/// Percentage decline of each equity value from the highest equity seen so
/// far. Zero while the peak is not positive.
pub fn drawdown_series(equity: &[Decimal]) -> Vec<Decimal> {
    let mut peak: Option<Decimal> = None;

    equity
        .iter()
        .map(|&value| {
            let current_peak = match peak {
                Some(p) if p >= value => p,
                _ => value,
            };
            peak = Some(current_peak);

            if current_peak <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                value
                    .saturating_sub(current_peak)
                    .checked_div(current_peak)
                    .unwrap_or(Decimal::MIN)
                    .saturating_mul(Decimal::ONE_HUNDRED)
            }
        })
        .collect()
}

/// P&L values sorted ascending with their percentile rank `(i + 1) / n * 100`.
pub fn cumulative_frequency(pnls: &[Decimal]) -> Vec<FrequencyPoint> {
    let mut sorted = pnls.to_vec();
    sorted.sort();
    let n = Decimal::from(sorted.len() as u64);

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, pnl)| FrequencyPoint {
            pnl,
            percentile: Decimal::from(((i + 1) * 100) as u64) / n,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn priced(direction: Direction, entry: Decimal, exit: Decimal, size: Decimal) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            ticker: "TEST".into(),
            direction,
            entry: Some(entry),
            exit: Some(exit),
            size: Some(size),
            pnl: None,
            notes: None,
            strategy: None,
            entry_date: None,
            exit_date: None,
            trade_time: None,
            timestamp: None,
        }
    }

    fn with_pnls(pnls: &[i64]) -> Vec<Trade> {
        pnls.iter()
            .map(|&p| {
                let mut t = priced(Direction::Long, dec!(0), dec!(0), dec!(0));
                t.pnl = Some(Decimal::from(p));
                t
            })
            .collect()
    }

    #[test]
    fn test_long_and_short_example() {
        let trades = vec![
            priced(Direction::Long, dec!(100), dec!(105), dec!(2)),
            priced(Direction::Short, dec!(50), dec!(45), dec!(1)),
        ];
        let stats = compute_stats(&trades, DEFAULT_ROLLING_WINDOW);

        assert_eq!(signed_pnls(&trades), vec![dec!(10), dec!(5)]);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.total_pnl, dec!(15));
        assert_eq!(stats.win_loss_ratio, dec!(2));
        assert_eq!(stats.average_r, dec!(7.5));
    }

    #[test]
    fn test_empty_input_is_zeroed() {
        let stats = compute_stats(&[], DEFAULT_ROLLING_WINDOW);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.wins, 0);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        assert_eq!(stats.average_r, Decimal::ZERO);
        assert_eq!(stats.win_loss_ratio, Decimal::ZERO);
        assert!(stats.equity_curve.is_empty());
        assert!(stats.rolling_win_rate.is_empty());
        assert!(stats.drawdown.is_empty());
        assert!(stats.cumulative_frequency.is_empty());
    }

    #[test]
    fn test_explicit_pnl_overrides_prices() {
        let mut t = priced(Direction::Long, dec!(100), dec!(105), dec!(2));
        t.pnl = Some(dec!(-3));
        let stats = compute_stats(&[t], DEFAULT_ROLLING_WINDOW);
        assert_eq!(stats.total_pnl, dec!(-3));
        assert_eq!(stats.losses, 1);
    }

    #[test]
    fn test_extreme_values_do_not_panic() {
        let trades = vec![
            priced(Direction::Long, dec!(0), Decimal::MAX, dec!(2)),
            priced(Direction::Long, dec!(0), Decimal::MAX, dec!(2)),
            priced(Direction::Short, dec!(0), Decimal::MAX, dec!(2)),
        ];
        let stats = compute_stats(&trades, DEFAULT_ROLLING_WINDOW);

        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_pnl, Decimal::ZERO);
        let equity: Vec<Decimal> = stats.equity_curve.iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![Decimal::MAX, Decimal::MAX, Decimal::ZERO]);
        assert_eq!(stats.drawdown[2], dec!(-100));
        assert!(stats.drawdown.iter().all(|d| *d <= Decimal::ZERO));
    }

    #[test]
    fn test_drawdown_from_tiny_peak_saturates() {
        let dd = drawdown_series(&[dec!(0.0000000000000000000000000001), -Decimal::MAX]);
        assert_eq!(dd[0], Decimal::ZERO);
        assert_eq!(dd[1], Decimal::MIN);
    }

    #[test]
    fn test_zero_pnl_counts_as_loss() {
        let (wins, losses) = win_loss_counts(&[dec!(0), dec!(1), dec!(-1)]);
        assert_eq!((wins, losses), (1, 2));
    }

    #[test]
    fn test_wins_plus_losses_equals_count() {
        let trades = with_pnls(&[5, -2, 0, 7, -1, 3]);
        let stats = compute_stats(&trades, 3);
        assert_eq!(stats.wins + stats.losses, stats.count);
        assert_eq!(stats.total_pnl, dec!(12));
    }

    #[test]
    fn test_equity_curve_is_running_sum() {
        let trades = with_pnls(&[10, -4, 6, -20]);
        let curve = equity_curve(&trades);
        let values: Vec<Decimal> = curve.iter().map(|p| p.equity).collect();
        assert_eq!(values, vec![dec!(10), dec!(6), dec!(12), dec!(-8)]);
    }

    #[test]
    fn test_rolling_win_rate_window() {
        let pnls = [dec!(1), dec!(-1), dec!(1), dec!(1), dec!(-1)];
        let rates = rolling_win_rate(&pnls, 2);
        assert_eq!(
            rates,
            vec![dec!(1), dec!(0.5), dec!(0.5), dec!(1), dec!(0.5)]
        );
    }

    #[test]
    fn test_rolling_win_rate_default_window_grows_then_slides() {
        let pnls: Vec<Decimal> = [1, 1, -1, 1, -1, -1, -1]
            .iter()
            .map(|&p| Decimal::from(p))
            .collect();
        let rates = rolling_win_rate(&pnls, DEFAULT_ROLLING_WINDOW);
        assert_eq!(rates[0], dec!(1));
        assert_eq!(rates[4], dec!(0.6));
        // window [2..=6] holds one win out of five
        assert_eq!(rates[6], dec!(0.2));
    }

    #[test]
    fn test_rolling_win_rate_zero_window() {
        let rates = rolling_win_rate(&[dec!(1), dec!(-1)], 0);
        assert_eq!(rates, vec![dec!(1), dec!(0)]);
    }

    #[test]
    fn test_drawdown_never_positive() {
        let equity = [dec!(10), dec!(5), dec!(20), dec!(15), dec!(25)];
        let dd = drawdown_series(&equity);
        assert_eq!(dd, vec![dec!(0), dec!(-50), dec!(0), dec!(-25), dec!(0)]);
        assert!(dd.iter().all(|d| *d <= Decimal::ZERO));
    }

    #[test]
    fn test_drawdown_zero_without_positive_peak() {
        let dd = drawdown_series(&[dec!(-5), dec!(-10), dec!(0)]);
        assert_eq!(dd, vec![dec!(0), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_cumulative_frequency_ends_at_100() {
        let pnls = [dec!(3), dec!(-2), dec!(7)];
        let freq = cumulative_frequency(&pnls);

        let values: Vec<Decimal> = freq.iter().map(|p| p.pnl).collect();
        assert_eq!(values, vec![dec!(-2), dec!(3), dec!(7)]);

        assert!(freq.windows(2).all(|w| w[0].percentile <= w[1].percentile));
        assert_eq!(freq.last().map(|p| p.percentile), Some(dec!(100)));
    }
}
