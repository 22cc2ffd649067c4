pub mod chart;

pub use chart::YahooChartSource;
