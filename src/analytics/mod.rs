pub mod charts;
pub mod filter;
pub mod stats;
pub mod table;

pub use charts::{build_charts, ChartBundle, ChartKind, ChartPoint, ChartSeries};
pub use filter::{apply, filter_trades, sort_trades, SortKey, TradeFilter};
pub use stats::{compute_stats, EquityPoint, FrequencyPoint, TradeStats, DEFAULT_ROLLING_WINDOW};
pub use table::{render_rows, TableRow};
