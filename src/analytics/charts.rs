use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Trade;

use super::stats::{self, TradeStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

/// A labeled point series handed to the charting front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub title: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn new(title: &str, kind: ChartKind, points: Vec<ChartPoint>) -> Self {
        Self {
            title: title.into(),
            kind,
            points,
        }
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }
}

/// Every chart on the analytics page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBundle {
    pub cumulative_pnl: ChartSeries,
    pub equity_curve: ChartSeries,
    pub pnl_distribution: ChartSeries,
    pub cumulative_frequency: ChartSeries,
    pub rolling_win_rate: ChartSeries,
    pub drawdown: ChartSeries,
    pub ticker_performance: ChartSeries,
}

/// Shape `trades` (already in the order the caller wants plotted) into chart
/// series. `today` labels records that carry no usable date.
pub fn build_charts(trades: &[Trade], window: usize, today: NaiveDate) -> ChartBundle {
    let stats = stats::compute_stats(trades, window);

    ChartBundle {
        cumulative_pnl: cumulative_pnl_by_date(trades, today),
        equity_curve: equity_series(&stats, today),
        pnl_distribution: pnl_distribution(trades),
        cumulative_frequency: frequency_series(&stats),
        rolling_win_rate: rolling_win_rate_series(&stats, window),
        drawdown: drawdown_series(&stats),
        ticker_performance: ticker_performance(trades),
    }
}

/// Daily P&L totals accumulated over calendar dates, oldest first.
///
/// Records without exit, entry or timestamp dates are booked on `today`.
/// That shifts undated P&L to the end of the curve; it is not corrected here.
pub fn cumulative_pnl_by_date(trades: &[Trade], today: NaiveDate) -> ChartSeries {
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for trade in trades {
        let day = trade.calendar_date().unwrap_or(today);
        let total = daily.entry(day).or_insert(Decimal::ZERO);
        *total = total.saturating_add(trade.signed_pnl());
    }

    let mut cumulative = Decimal::ZERO;
    let points = daily
        .into_iter()
        .map(|(day, pnl)| {
            cumulative = cumulative.saturating_add(pnl);
            ChartPoint {
                label: day.to_string(),
                value: cumulative,
            }
        })
        .collect();

    ChartSeries::new("Cumulative P&L", ChartKind::Line, points)
}

pub fn equity_series(stats: &TradeStats, today: NaiveDate) -> ChartSeries {
    let points = stats
        .equity_curve
        .iter()
        .map(|p| ChartPoint {
            label: p
                .timestamp
                .map(|t| t.date_naive())
                .unwrap_or(today)
                .to_string(),
            value: p.equity,
        })
        .collect();

    ChartSeries::new("Equity Curve", ChartKind::Line, points)
}

/// Signed P&L per trade, labeled `Trade N`.
pub fn pnl_distribution(trades: &[Trade]) -> ChartSeries {
    ChartSeries::new("P&L Distribution", ChartKind::Bar, per_trade(stats::signed_pnls(trades)))
}

pub fn frequency_series(stats: &TradeStats) -> ChartSeries {
    let points = stats
        .cumulative_frequency
        .iter()
        .map(|p| ChartPoint {
            label: p.pnl.to_string(),
            value: p.percentile,
        })
        .collect();

    ChartSeries::new("Cumulative Frequency (%)", ChartKind::Line, points)
}

pub fn rolling_win_rate_series(stats: &TradeStats, window: usize) -> ChartSeries {
    let title = format!("Rolling Win Rate ({} trades)", window.max(1));
    let points = per_trade(stats.rolling_win_rate.clone());
    ChartSeries::new(&title, ChartKind::Line, points)
}

pub fn drawdown_series(stats: &TradeStats) -> ChartSeries {
    ChartSeries::new("Drawdown (%)", ChartKind::Line, per_trade(stats.drawdown.clone()))
}

/// Total signed P&L per ticker, in order of first appearance.
pub fn ticker_performance(trades: &[Trade]) -> ChartSeries {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, Decimal)> = Vec::new();

    for trade in trades {
        let pnl = trade.signed_pnl();
        let existing = index.get(trade.ticker.as_str()).copied();
        match existing {
            Some(i) => totals[i].1 = totals[i].1.saturating_add(pnl),
            None => {
                index.insert(trade.ticker.as_str(), totals.len());
                totals.push((trade.ticker.as_str(), pnl));
            }
        }
    }

    let points = totals
        .into_iter()
        .map(|(ticker, value)| ChartPoint {
            label: ticker.to_string(),
            value,
        })
        .collect();

    ChartSeries::new("Performance by Ticker", ChartKind::Bar, points)
}

fn per_trade(values: Vec<Decimal>) -> Vec<ChartPoint> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| ChartPoint {
            label: format!("Trade {}", i + 1),
            value,
        })
        .collect()
}
