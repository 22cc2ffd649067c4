pub mod dashboard;
pub mod headless;
pub mod history;

pub use dashboard::Dashboard;
pub use history::{AlertHistory, HistoryEntry};
